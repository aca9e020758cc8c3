//! Domain types for the readiness gate.
//!
//! This module contains the core data structures:
//! - Precondition: a statically-defined assertion about a data location
//! - Verdict: the evaluated outcome of one precondition
//! - GateResult: aggregate pass/fail outcome over all verdicts

pub mod precondition;
pub mod verdict;

// Re-export commonly used types
pub use precondition::{Assertion, Precondition, TableRef};
pub use verdict::{Check, FailureKind, GateError, GateResult, Verdict, Violation};
