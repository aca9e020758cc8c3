//! Store configuration for readygate.
//!
//! Configuration sources (highest priority first):
//! 1. READYGATE_CONFIG environment variable (explicit path)
//! 2. Config file discovered by searching current directory and parents
//!    for .readygate/config.yaml
//!
//! The loaded configuration is validated once and passed explicitly to
//! constructors; nothing is cached in global state. Passwords are never
//! written in the file itself — a store names an environment variable
//! via `password_env` and the value is resolved at load time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file path
pub const CONFIG_ENV: &str = "READYGATE_CONFIG";

/// Default per-query timeout when the config file does not set one
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub stores: HashMap<String, StoreFileConfig>,
    #[serde(default)]
    pub gate: Option<GateConfig>,
}

/// One store entry as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct StoreFileConfig {
    pub kind: StoreKind,
    pub host: String,
    /// Defaults per kind: 8123 for clickhouse (HTTP), 5432 for postgres
    pub port: Option<u16>,
    pub user: String,
    /// Name of the environment variable holding the password
    pub password_env: Option<String>,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    pub default_timeout_seconds: Option<u64>,
}

/// Supported store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Columnar analytics store, queried over the HTTP interface
    ClickHouse,
    /// Relational source database
    Postgres,
}

impl StoreKind {
    fn default_port(self) -> u16 {
        match self {
            StoreKind::ClickHouse => 8123,
            StoreKind::Postgres => 5432,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::ClickHouse => "clickhouse",
            StoreKind::Postgres => "postgres",
        }
    }
}

/// Validated connection settings for one store
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

/// Resolved configuration passed to gate and store constructors
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Store identifier -> validated settings
    pub stores: HashMap<String, StoreSettings>,

    /// Default per-query timeout for preconditions without an override
    pub default_timeout: Duration,

    /// Path the configuration was loaded from
    pub config_file: PathBuf,
}

impl ResolvedConfig {
    /// Load configuration from the explicit path, the READYGATE_CONFIG
    /// environment variable, or parent-directory discovery, in that order.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => locate_config_file()?,
        };

        let file = read_config_file(&path)?;
        resolve(file, path)
    }

    /// Render for display with credentials redacted
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("config file: {}", self.config_file.display())];
        let mut names: Vec<&String> = self.stores.keys().collect();
        names.sort();
        for name in names {
            let s = &self.stores[name];
            lines.push(format!(
                "{}: kind={} host={} port={} user={} database={} password={}",
                name,
                s.kind.as_str(),
                s.host,
                s.port,
                s.user,
                s.database,
                if s.password.is_some() { "<set>" } else { "<none>" },
            ));
        }
        lines.join("\n")
    }
}

/// Find .readygate/config.yaml by searching current directory and parents
fn locate_config_file() -> Result<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(env_path));
    }

    let mut current = std::env::current_dir().context("Failed to determine current directory")?;

    loop {
        let candidate = current.join(".readygate").join("config.yaml");
        if candidate.exists() {
            return Ok(candidate);
        }

        if !current.pop() {
            anyhow::bail!(
                "No .readygate/config.yaml found in current directory or parents \
                 (set {} to point at a config file)",
                CONFIG_ENV
            );
        }
    }
}

/// Load and parse a config file
fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Validate the raw file and resolve credentials
fn resolve(file: ConfigFile, path: PathBuf) -> Result<ResolvedConfig> {
    if file.stores.is_empty() {
        anyhow::bail!("Config file defines no stores: {}", path.display());
    }

    let mut stores = HashMap::new();

    for (name, raw) in file.stores {
        if name.is_empty() {
            anyhow::bail!("Store with empty name in {}", path.display());
        }
        if raw.host.is_empty() {
            anyhow::bail!("Store '{}' has an empty host", name);
        }
        if raw.user.is_empty() {
            anyhow::bail!("Store '{}' has an empty user", name);
        }
        if raw.database.is_empty() {
            anyhow::bail!("Store '{}' has an empty database", name);
        }

        // A named password variable must resolve now, not at first query
        let password = match &raw.password_env {
            Some(var) => Some(std::env::var(var).with_context(|| {
                format!(
                    "Store '{}' names password_env {} but it is not set",
                    name, var
                )
            })?),
            None => None,
        };

        stores.insert(
            name,
            StoreSettings {
                kind: raw.kind,
                host: raw.host,
                port: raw.port.unwrap_or_else(|| raw.kind.default_port()),
                user: raw.user,
                password,
                database: raw.database,
            },
        );
    }

    let default_timeout = Duration::from_secs(
        file.gate
            .as_ref()
            .and_then(|g| g.default_timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
    );

    Ok(ResolvedConfig {
        stores,
        default_timeout,
        config_file: path,
    })
}
