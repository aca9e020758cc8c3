//! Precondition definitions.
//!
//! A precondition names a data location (store + fully-qualified table)
//! and an assertion about its readiness. Preconditions are fixed at
//! definition time; the gate never discovers them dynamically.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A fully-qualified table reference (`schema.table`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// What a precondition asserts about its store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assertion {
    /// The store answers a no-op query (connectivity probe)
    Reachable,

    /// The named table holds at least `min` rows
    MinRows { table: TableRef, min: u64 },
}

/// A single readiness precondition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precondition {
    /// Configured store identifier this precondition targets
    pub store: String,

    /// The assertion to evaluate
    pub assertion: Assertion,

    /// Per-query timeout override in seconds (uses the gate default if not set)
    pub timeout_seconds: Option<u64>,
}

impl Precondition {
    /// Connectivity probe against a store
    pub fn probe(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            assertion: Assertion::Reachable,
            timeout_seconds: None,
        }
    }

    /// Minimum-row-count assertion against a table
    pub fn min_rows(
        store: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        min: u64,
    ) -> Self {
        Self {
            store: store.into(),
            assertion: Assertion::MinRows {
                table: TableRef::new(schema, table),
                min,
            },
            timeout_seconds: None,
        }
    }

    /// Data location as it appears in diagnostic lines
    ///
    /// Table assertions render as `store.schema.table`; probes have no
    /// table and render as the bare store name.
    pub fn location(&self) -> String {
        match &self.assertion {
            Assertion::Reachable => self.store.clone(),
            Assertion::MinRows { table, .. } => format!("{}.{}", self.store, table),
        }
    }

    /// Effective timeout for each query issued by this precondition
    pub fn timeout(&self, default: Duration) -> Duration {
        self.timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_for_table_assertion() {
        let pre = Precondition::min_rows("warehouse", "staging", "customers", 1);
        assert_eq!(pre.location(), "warehouse.staging.customers");
    }

    #[test]
    fn test_location_for_probe() {
        let pre = Precondition::probe("warehouse");
        assert_eq!(pre.location(), "warehouse");
    }

    #[test]
    fn test_timeout_fallback_to_default() {
        let mut pre = Precondition::probe("warehouse");
        assert_eq!(pre.timeout(Duration::from_secs(30)), Duration::from_secs(30));

        pre.timeout_seconds = Some(5);
        assert_eq!(pre.timeout(Duration::from_secs(30)), Duration::from_secs(5));
    }
}
