//! ClickHouse store over the HTTP interface.
//!
//! Queries are POSTed to `http://host:port/` with credentials in the
//! X-ClickHouse-User / X-ClickHouse-Key headers and the target database
//! as a query parameter. Counts use FORMAT TabSeparated so the response
//! body is the bare number.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::{StoreKind, StoreSettings};

use super::{Store, StoreSession};

/// ClickHouse analytics store
pub struct ClickHouseStore {
    name: String,
    settings: StoreSettings,
}

impl ClickHouseStore {
    pub fn new(name: String, settings: StoreSettings) -> Self {
        Self { name, settings }
    }
}

#[async_trait]
impl Store for ClickHouseStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StoreKind {
        StoreKind::ClickHouse
    }

    async fn open(&self) -> Result<Box<dyn StoreSession>> {
        // HTTP is stateless; the session is a configured client. Errors
        // surface on the first query rather than here.
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client for ClickHouse")?;

        Ok(Box::new(ClickHouseSession {
            client,
            url: format!("http://{}:{}/", self.settings.host, self.settings.port),
            settings: self.settings.clone(),
        }))
    }
}

struct ClickHouseSession {
    client: reqwest::Client,
    url: String,
    settings: StoreSettings,
}

impl ClickHouseSession {
    /// Execute a query and return the raw response body
    async fn execute(&self, sql: &str) -> Result<String> {
        let mut request = self
            .client
            .post(&self.url)
            .query(&[("database", self.settings.database.as_str())])
            .header("X-ClickHouse-User", &self.settings.user)
            .body(sql.to_string());

        if let Some(password) = &self.settings.password {
            request = request.header("X-ClickHouse-Key", password);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("ClickHouse request to {} failed", self.url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read ClickHouse response body")?;

        if !status.is_success() {
            anyhow::bail!(
                "ClickHouse query failed with status {}: {}",
                status,
                body.trim()
            );
        }

        Ok(body)
    }
}

#[async_trait]
impl StoreSession for ClickHouseSession {
    async fn ping(&mut self) -> Result<()> {
        self.execute("SELECT 1").await?;
        Ok(())
    }

    async fn count_rows(&mut self, schema: &str, table: &str) -> Result<u64> {
        let sql = format!(
            "SELECT count(*) FROM {}.{} FORMAT TabSeparated",
            schema, table
        );
        let body = self.execute(&sql).await?;

        body.trim()
            .parse::<u64>()
            .with_context(|| format!("Unexpected count response from ClickHouse: {:?}", body))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        // No server-side session to release over HTTP
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreKind;

    fn settings() -> StoreSettings {
        StoreSettings {
            kind: StoreKind::ClickHouse,
            host: "clickhouse".to_string(),
            port: 8123,
            user: "default".to_string(),
            password: None,
            database: "analytics".to_string(),
        }
    }

    #[test]
    fn test_store_identity() {
        let store = ClickHouseStore::new("warehouse".to_string(), settings());
        assert_eq!(store.name(), "warehouse");
        assert_eq!(store.kind(), StoreKind::ClickHouse);
    }

    #[tokio::test]
    async fn test_session_url() {
        let store = ClickHouseStore::new("warehouse".to_string(), settings());
        // open() succeeds without a reachable server; errors surface on query
        assert!(store.open().await.is_ok());
    }
}
