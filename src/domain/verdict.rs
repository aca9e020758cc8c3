//! Verdicts and gate results.
//!
//! A Verdict is the evaluated outcome of one precondition; a GateResult
//! aggregates every verdict of one gate invocation. Both are produced
//! fresh per invocation and never persisted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::precondition::Precondition;

/// Outcome of evaluating one precondition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Assertion holds. `observed` is the row count for table assertions,
    /// absent for connectivity probes.
    Satisfied { observed: Option<u64> },

    /// Assertion does not hold
    Violated(Violation),
}

impl Verdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied { .. })
    }
}

/// Why a precondition failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// Store unreachable, authentication rejected, or the query itself
    /// failed (e.g. the table does not exist)
    #[error("unreachable: {cause}")]
    Unreachable { cause: String },

    /// The bounded query did not complete in time
    #[error("query timed out after {limit_seconds}s")]
    Timeout { limit_seconds: u64 },

    /// Store reachable but the table has zero rows
    #[error("empty table")]
    Empty,

    /// Store reachable but the table has fewer rows than required
    #[error("row count {observed} below minimum {min}")]
    BelowMinimum { observed: u64, min: u64 },
}

impl Violation {
    /// Classify for remediation: infra/ops issue vs upstream data issue
    pub fn kind(&self) -> FailureKind {
        match self {
            Violation::Unreachable { .. } | Violation::Timeout { .. } => FailureKind::Connectivity,
            Violation::Empty | Violation::BelowMinimum { .. } => FailureKind::Data,
        }
    }
}

/// Remediation category of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Store unreachable or query failed/timed out
    Connectivity,
    /// Store reachable but the data assertion failed
    Data,
}

/// One precondition paired with its verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub precondition: Precondition,
    pub verdict: Verdict,
}

impl Check {
    /// Render as one stable diagnostic line:
    /// `<store>.<schema>.<table>: <status> (<detail>)`
    pub fn render(&self) -> String {
        let location = self.precondition.location();
        match &self.verdict {
            Verdict::Satisfied { observed: Some(n) } => {
                format!("{}: satisfied ({} rows)", location, n)
            }
            Verdict::Satisfied { observed: None } => {
                format!("{}: satisfied (reachable)", location)
            }
            Verdict::Violated(violation) => {
                format!("{}: violated ({})", location, violation)
            }
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Aggregate outcome of one gate invocation
///
/// Holds exactly one Check per input precondition, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct GateResult {
    /// Invocation id for log correlation
    pub id: Uuid,

    /// When evaluation finished
    pub evaluated_at: DateTime<Utc>,

    /// One entry per precondition, in input order
    pub checks: Vec<Check>,
}

impl GateResult {
    pub fn new(checks: Vec<Check>) -> Self {
        Self {
            id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            checks,
        }
    }

    /// Pass iff every verdict is Satisfied
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.verdict.is_satisfied())
    }

    /// Checks whose verdicts are Violated, in input order
    pub fn violations(&self) -> impl Iterator<Item = &Check> {
        self.checks
            .iter()
            .filter(|c| !c.verdict.is_satisfied())
    }

    /// Full diagnostic report, one line per check, in input order
    pub fn render(&self) -> String {
        self.checks
            .iter()
            .map(Check::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Convert into a hard failure for the calling pipeline
    ///
    /// Ok(self) on pass; Err(GateError) carrying the full result otherwise.
    pub fn into_outcome(self) -> Result<GateResult, GateError> {
        if self.passed() {
            Ok(self)
        } else {
            Err(GateError::new(self))
        }
    }
}

/// Aggregate failure surfaced to the caller when the gate does not pass
///
/// The calling orchestrator is expected to treat this as "abort this run";
/// the full GateResult stays available for reporting.
#[derive(Debug, Error)]
#[error("readiness gate failed: {violated} of {total} preconditions violated\n{report}")]
pub struct GateError {
    pub violated: usize,
    pub total: usize,
    report: String,
    pub result: GateResult,
}

impl GateError {
    fn new(result: GateResult) -> Self {
        Self {
            violated: result.violations().count(),
            total: result.checks.len(),
            report: result.render(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfied(store: &str, schema: &str, table: &str, rows: u64) -> Check {
        Check {
            precondition: Precondition::min_rows(store, schema, table, 1),
            verdict: Verdict::Satisfied {
                observed: Some(rows),
            },
        }
    }

    fn violated(store: &str, schema: &str, table: &str, violation: Violation) -> Check {
        Check {
            precondition: Precondition::min_rows(store, schema, table, 1),
            verdict: Verdict::Violated(violation),
        }
    }

    #[test]
    fn test_pass_iff_all_satisfied() {
        let result = GateResult::new(vec![
            satisfied("warehouse", "staging", "customers", 5),
            satisfied("warehouse", "staging", "orders", 12),
        ]);
        assert!(result.passed());

        let result = GateResult::new(vec![
            satisfied("warehouse", "staging", "customers", 5),
            violated("warehouse", "staging", "orders", Violation::Empty),
        ]);
        assert!(!result.passed());
        assert_eq!(result.violations().count(), 1);
    }

    #[test]
    fn test_render_line_format() {
        let check = satisfied("warehouse", "staging", "customers", 5);
        assert_eq!(
            check.render(),
            "warehouse.staging.customers: satisfied (5 rows)"
        );

        let check = violated("warehouse", "staging", "orders", Violation::Empty);
        assert_eq!(
            check.render(),
            "warehouse.staging.orders: violated (empty table)"
        );
    }

    #[test]
    fn test_violation_classification() {
        let unreachable = Violation::Unreachable {
            cause: "connection refused".to_string(),
        };
        assert_eq!(unreachable.kind(), FailureKind::Connectivity);
        assert_eq!(
            Violation::Timeout { limit_seconds: 30 }.kind(),
            FailureKind::Connectivity
        );
        assert_eq!(Violation::Empty.kind(), FailureKind::Data);
        assert_eq!(
            Violation::BelowMinimum {
                observed: 3,
                min: 10
            }
            .kind(),
            FailureKind::Data
        );
    }

    #[test]
    fn test_into_outcome_carries_full_report() {
        let result = GateResult::new(vec![
            satisfied("warehouse", "staging", "customers", 5),
            violated("warehouse", "staging", "orders", Violation::Empty),
        ]);

        let err = result.into_outcome().unwrap_err();
        assert_eq!(err.violated, 1);
        assert_eq!(err.total, 2);
        // Both checks appear in the message, not just the failing one
        let message = err.to_string();
        assert!(message.contains("warehouse.staging.customers: satisfied (5 rows)"));
        assert!(message.contains("warehouse.staging.orders: violated (empty table)"));
    }
}
