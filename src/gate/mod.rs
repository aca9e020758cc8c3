//! Readiness gate evaluation.
//!
//! Evaluates an ordered sequence of preconditions against configured
//! stores and aggregates the verdicts into a single pass/fail result.
//! The gate evaluates every precondition even after the first violation
//! so the report names every failing table at once, never retries, and
//! leaves retry/alerting policy to the caller.

pub mod manifest;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::domain::{Assertion, Check, GateResult, Precondition, Verdict, Violation};
use crate::stores::{Store, StoreSession};

pub use manifest::Manifest;

/// Evaluates preconditions and produces a GateResult
pub struct ReadinessGate {
    /// Store identifier -> store
    stores: HashMap<String, Arc<dyn Store>>,

    /// Timeout for preconditions without an explicit override
    default_timeout: Duration,
}

impl ReadinessGate {
    pub fn new(stores: HashMap<String, Arc<dyn Store>>, default_timeout: Duration) -> Self {
        Self {
            stores,
            default_timeout,
        }
    }

    /// Evaluate all preconditions, in order, and aggregate the verdicts.
    ///
    /// Returns exactly one check per input precondition. A violation never
    /// short-circuits the remaining preconditions; each is evaluated on its
    /// own session with its own timeout, so a slow store cannot mask an
    /// already-detected violation elsewhere.
    #[instrument(skip(self, preconditions), fields(count = preconditions.len()))]
    pub async fn evaluate(&self, preconditions: &[Precondition]) -> GateResult {
        let mut checks = Vec::with_capacity(preconditions.len());

        for precondition in preconditions {
            let verdict = self.evaluate_one(precondition).await;

            match &verdict {
                Verdict::Satisfied { observed } => {
                    info!(
                        target_location = %precondition.location(),
                        observed = observed.unwrap_or(0),
                        "Precondition satisfied"
                    );
                }
                Verdict::Violated(violation) => {
                    warn!(
                        target_location = %precondition.location(),
                        kind = ?violation.kind(),
                        reason = %violation,
                        "Precondition violated"
                    );
                }
            }

            checks.push(Check {
                precondition: precondition.clone(),
                verdict,
            });
        }

        let result = GateResult::new(checks);
        info!(
            gate_id = %result.id,
            passed = result.passed(),
            violations = result.violations().count(),
            "Gate evaluation complete"
        );
        result
    }

    /// Evaluate one precondition on a fresh session
    async fn evaluate_one(&self, precondition: &Precondition) -> Verdict {
        let store = match self.stores.get(&precondition.store) {
            Some(store) => store,
            None => {
                return Verdict::Violated(Violation::Unreachable {
                    cause: format!("unknown store '{}'", precondition.store),
                });
            }
        };

        let timeout = precondition.timeout(self.default_timeout);

        // Session acquisition failure is a connectivity verdict, not a panic
        let mut session = match tokio::time::timeout(timeout, store.open()).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                return Verdict::Violated(Violation::Unreachable {
                    cause: format!("{:#}", e),
                });
            }
            Err(_) => {
                return Verdict::Violated(Violation::Timeout {
                    limit_seconds: timeout.as_secs(),
                });
            }
        };

        let verdict = Self::run_assertion(&mut *session, &precondition.assertion, timeout).await;

        // Release on every exit path; a failed close does not change the verdict
        if let Err(e) = session.close().await {
            warn!(
                store = %precondition.store,
                error = %format!("{:#}", e),
                "Failed to close store session"
            );
        }

        verdict
    }

    /// Run the assertion query, bounded by the per-precondition timeout
    async fn run_assertion(
        session: &mut dyn StoreSession,
        assertion: &Assertion,
        timeout: Duration,
    ) -> Verdict {
        match assertion {
            Assertion::Reachable => {
                match tokio::time::timeout(timeout, session.ping()).await {
                    Ok(Ok(())) => Verdict::Satisfied { observed: None },
                    Ok(Err(e)) => Verdict::Violated(Violation::Unreachable {
                        cause: format!("{:#}", e),
                    }),
                    Err(_) => Verdict::Violated(Violation::Timeout {
                        limit_seconds: timeout.as_secs(),
                    }),
                }
            }
            Assertion::MinRows { table, min } => {
                match tokio::time::timeout(timeout, session.count_rows(&table.schema, &table.table))
                    .await
                {
                    Ok(Ok(0)) => Verdict::Violated(Violation::Empty),
                    Ok(Ok(count)) if count < *min => Verdict::Violated(Violation::BelowMinimum {
                        observed: count,
                        min: *min,
                    }),
                    Ok(Ok(count)) => Verdict::Satisfied {
                        observed: Some(count),
                    },
                    Ok(Err(e)) => Verdict::Violated(Violation::Unreachable {
                        cause: format!("{:#}", e),
                    }),
                    Err(_) => Verdict::Violated(Violation::Timeout {
                        limit_seconds: timeout.as_secs(),
                    }),
                }
            }
        }
    }
}
