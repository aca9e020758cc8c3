//! Store connection interfaces for external data stores.
//!
//! Stores provide a unified interface for the gate's read-only queries
//! against the analytics warehouse (ClickHouse) and the relational
//! source database (PostgreSQL).

pub mod clickhouse;
pub mod postgres;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{ResolvedConfig, StoreKind};

pub use clickhouse::ClickHouseStore;
pub use postgres::PostgresStore;

/// A configured data store the gate can query
#[async_trait]
pub trait Store: Send + Sync {
    /// Configured store identifier (referenced by preconditions)
    fn name(&self) -> &str;

    /// Backend kind, for diagnostics
    fn kind(&self) -> StoreKind;

    /// Open a session for one precondition evaluation
    ///
    /// Sessions are never shared or reused; the gate closes each one
    /// before evaluating the next precondition.
    async fn open(&self) -> Result<Box<dyn StoreSession>>;
}

/// A single query session against a store
///
/// All operations are read-only `SELECT`s.
#[async_trait]
pub trait StoreSession: Send {
    /// No-op query proving the store answers
    async fn ping(&mut self) -> Result<()>;

    /// Row count of a fully-qualified table
    async fn count_rows(&mut self, schema: &str, table: &str) -> Result<u64>;

    /// Release the session (explicit close on every exit path)
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Build the store registry from resolved configuration
pub fn build_stores(config: &ResolvedConfig) -> HashMap<String, Arc<dyn Store>> {
    let mut stores: HashMap<String, Arc<dyn Store>> = HashMap::new();

    for (name, settings) in &config.stores {
        let store: Arc<dyn Store> = match settings.kind {
            StoreKind::ClickHouse => Arc::new(ClickHouseStore::new(name.clone(), settings.clone())),
            StoreKind::Postgres => Arc::new(PostgresStore::new(name.clone(), settings.clone())),
        };
        stores.insert(name.clone(), store);
    }

    stores
}
