//! PostgreSQL source-database store.
//!
//! Each session is one `PgConnection`, opened and closed explicitly per
//! precondition evaluation. The gate forbids pooling, so no `PgPool` here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};

use crate::config::{StoreKind, StoreSettings};

use super::{Store, StoreSession};

/// PostgreSQL relational store
pub struct PostgresStore {
    name: String,
    settings: StoreSettings,
}

impl PostgresStore {
    pub fn new(name: String, settings: StoreSettings) -> Self {
        Self { name, settings }
    }

    fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.settings.host)
            .port(self.settings.port)
            .username(&self.settings.user)
            .database(&self.settings.database);

        if let Some(password) = &self.settings.password {
            options = options.password(password);
        }

        options
    }
}

#[async_trait]
impl Store for PostgresStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Postgres
    }

    async fn open(&self) -> Result<Box<dyn StoreSession>> {
        let conn = self
            .connect_options()
            .connect()
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to postgres at {}:{}",
                    self.settings.host, self.settings.port
                )
            })?;

        Ok(Box::new(PostgresSession { conn }))
    }
}

struct PostgresSession {
    conn: PgConnection,
}

#[async_trait]
impl StoreSession for PostgresSession {
    async fn ping(&mut self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&mut self.conn)
            .await
            .context("Postgres ping query failed")?;
        Ok(())
    }

    async fn count_rows(&mut self, schema: &str, table: &str) -> Result<u64> {
        // Identifiers are validated at manifest load; quote them anyway
        let sql = format!(r#"SELECT count(*) FROM "{}"."{}""#, schema, table);

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut self.conn)
            .await
            .with_context(|| format!("Count query against {}.{} failed", schema, table))?;

        Ok(count.max(0) as u64)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .context("Failed to close postgres connection")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> StoreSettings {
        StoreSettings {
            kind: StoreKind::Postgres,
            host: "postgres".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: Some("postgres".to_string()),
            database: "source_db".to_string(),
        }
    }

    #[test]
    fn test_store_identity() {
        let store = PostgresStore::new("source".to_string(), settings());
        assert_eq!(store.name(), "source");
        assert_eq!(store.kind(), StoreKind::Postgres);
    }

    #[test]
    fn test_connect_options_carry_settings() {
        let store = PostgresStore::new("source".to_string(), settings());
        let options = store.connect_options();
        assert_eq!(options.get_host(), "postgres");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("source_db"));
    }
}
