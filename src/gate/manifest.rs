//! Gate manifest definitions and loading.
//!
//! A manifest is defined in YAML and declares the ordered precondition
//! list for one pipeline plus an optional transform stage to run when
//! the gate passes.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ResolvedConfig;
use crate::domain::{Assertion, Precondition, TableRef};

/// Default timeout for the transform stage (one hour)
const DEFAULT_TRANSFORM_TIMEOUT_SECONDS: u64 = 3600;

/// A complete gate manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: String,

    /// Ordered list of preconditions to evaluate
    pub preconditions: Vec<PreconditionEntry>,

    /// Optional transform stage, run only when the gate passes
    #[serde(default)]
    pub transform: Option<TransformSpec>,
}

/// One precondition as written in the manifest
///
/// An entry with only a store name is a connectivity probe; an entry with
/// schema + table is a row-count assertion (min_rows defaults to 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreconditionEntry {
    pub store: String,

    pub schema: Option<String>,
    pub table: Option<String>,

    /// Minimum row count for table entries (default 1: non-empty)
    pub min_rows: Option<u64>,

    /// Per-query timeout override in seconds
    pub timeout_seconds: Option<u64>,
}

/// The downstream transformation command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformSpec {
    /// Executable to run (e.g. "dbt")
    pub command: String,

    /// Arguments (e.g. ["build"])
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the command
    pub workdir: Option<String>,

    /// Timeout for the whole transform run in seconds
    pub timeout_seconds: Option<u64>,
}

impl TransformSpec {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_seconds
                .unwrap_or(DEFAULT_TRANSFORM_TIMEOUT_SECONDS),
        )
    }
}

impl Manifest {
    /// Load a manifest from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse a manifest from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse manifest YAML")
    }

    /// Validate the manifest against the resolved store configuration
    ///
    /// Schema/table names are interpolated into count queries, so only
    /// plain SQL identifiers are admitted.
    pub fn validate(&self, config: &ResolvedConfig) -> Result<()> {
        if self.preconditions.is_empty() {
            anyhow::bail!("Manifest must declare at least one precondition");
        }

        for (i, entry) in self.preconditions.iter().enumerate() {
            if entry.store.is_empty() {
                anyhow::bail!("Precondition {} has an empty store name", i);
            }

            if !config.stores.contains_key(&entry.store) {
                anyhow::bail!(
                    "Precondition {} references unknown store '{}'",
                    i,
                    entry.store
                );
            }

            match (&entry.schema, &entry.table) {
                (Some(schema), Some(table)) => {
                    if !is_identifier(schema) {
                        anyhow::bail!(
                            "Precondition {} has invalid schema name '{}'",
                            i,
                            schema
                        );
                    }
                    if !is_identifier(table) {
                        anyhow::bail!("Precondition {} has invalid table name '{}'", i, table);
                    }
                    if entry.min_rows == Some(0) {
                        anyhow::bail!(
                            "Precondition {} has min_rows 0 (must be at least 1)",
                            i
                        );
                    }
                }
                (None, None) => {
                    // Connectivity probe; a row threshold makes no sense here
                    if entry.min_rows.is_some() {
                        anyhow::bail!(
                            "Precondition {} sets min_rows but names no table",
                            i
                        );
                    }
                }
                _ => {
                    anyhow::bail!(
                        "Precondition {} must set both schema and table, or neither",
                        i
                    );
                }
            }
        }

        if let Some(transform) = &self.transform {
            if transform.command.is_empty() {
                anyhow::bail!("Transform command cannot be empty");
            }
        }

        Ok(())
    }

    /// Turn validated entries into the gate's precondition sequence
    pub fn compile(&self) -> Vec<Precondition> {
        self.preconditions
            .iter()
            .map(|entry| {
                let assertion = match (&entry.schema, &entry.table) {
                    (Some(schema), Some(table)) => Assertion::MinRows {
                        table: TableRef::new(schema.clone(), table.clone()),
                        min: entry.min_rows.unwrap_or(1),
                    },
                    _ => Assertion::Reachable,
                };

                Precondition {
                    store: entry.store.clone(),
                    assertion,
                    timeout_seconds: entry.timeout_seconds,
                }
            })
            .collect()
    }
}

/// Plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MANIFEST_YAML: &str = r#"
version: "1"

preconditions:
  - store: warehouse

  - store: warehouse
    schema: staging
    table: customers
    min_rows: 1
    timeout_seconds: 15

transform:
  command: dbt
  args: ["build"]
  timeout_seconds: 1800
"#;

    #[test]
    fn test_manifest_parsing() {
        let manifest = Manifest::from_yaml(TEST_MANIFEST_YAML).unwrap();

        assert_eq!(manifest.version, "1");
        assert_eq!(manifest.preconditions.len(), 2);

        let transform = manifest.transform.unwrap();
        assert_eq!(transform.command, "dbt");
        assert_eq!(transform.args, vec!["build"]);
        assert_eq!(transform.timeout(), Duration::from_secs(1800));
    }

    #[test]
    fn test_compile_probe_and_table_entries() {
        let manifest = Manifest::from_yaml(TEST_MANIFEST_YAML).unwrap();
        let preconditions = manifest.compile();

        assert_eq!(preconditions.len(), 2);
        assert_eq!(preconditions[0].assertion, Assertion::Reachable);
        assert_eq!(
            preconditions[1].assertion,
            Assertion::MinRows {
                table: TableRef::new("staging", "customers"),
                min: 1,
            }
        );
        assert_eq!(preconditions[1].timeout_seconds, Some(15));
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("staging"));
        assert!(is_identifier("order_items"));
        assert!(is_identifier("_internal"));

        assert!(!is_identifier(""));
        assert!(!is_identifier("1staging"));
        assert!(!is_identifier("staging;drop"));
        assert!(!is_identifier("staging.orders"));
        assert!(!is_identifier("órdenes"));
    }
}
