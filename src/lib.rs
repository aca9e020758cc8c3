//! readygate - pre-flight data-readiness gate for analytics pipelines
//!
//! Before a scheduled transformation run is allowed to proceed, readygate
//! verifies a fixed set of preconditions about upstream data: stores are
//! reachable and staging tables are non-empty. A failed gate aborts the
//! run with a report naming every violating table, not just the first.
//!
//! # Architecture
//!
//! - Preconditions are declared once in a YAML manifest, never discovered
//!   dynamically
//! - Every precondition is evaluated even after a violation, so operators
//!   see all failures in one report
//! - Verdicts carry a typed taxonomy: connectivity failures (infra issue)
//!   are distinguishable from data failures (upstream pipeline issue)
//! - The gate never retries; retry and alerting policy belong to the
//!   calling scheduler
//!
//! # Modules
//!
//! - `domain`: Data structures (Precondition, Verdict, GateResult)
//! - `gate`: Gate evaluation and manifest loading
//! - `stores`: Store connection interfaces (ClickHouse, PostgreSQL)
//! - `runner`: Transform stage subprocess runner
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Evaluate the gate for a manifest
//! readygate check --manifest gate.yaml
//!
//! # Probe connectivity of all configured stores
//! readygate probe
//!
//! # Gate, then run the transform stage on pass
//! readygate run --manifest gate.yaml
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod gate;
pub mod runner;
pub mod stores;

// Re-export main types at crate root for convenience
pub use config::{ResolvedConfig, StoreKind, StoreSettings};
pub use domain::{
    Assertion, Check, FailureKind, GateError, GateResult, Precondition, TableRef, Verdict,
    Violation,
};
pub use gate::{Manifest, ReadinessGate};
pub use runner::{TransformOutput, TransformRunner};
pub use stores::{ClickHouseStore, PostgresStore, Store, StoreSession};
