//! Diagnostic Report Tests
//!
//! The text lines are the contract operators grep in run logs; the JSON
//! form is for machines. Both must stay stable.

use readygate::{Check, GateResult, Precondition, Verdict, Violation};

fn sample_result() -> GateResult {
    GateResult::new(vec![
        Check {
            precondition: Precondition::min_rows("warehouse", "staging", "customers", 1),
            verdict: Verdict::Satisfied { observed: Some(5) },
        },
        Check {
            precondition: Precondition::probe("source"),
            verdict: Verdict::Satisfied { observed: None },
        },
        Check {
            precondition: Precondition::min_rows("warehouse", "staging", "orders", 1),
            verdict: Verdict::Violated(Violation::Empty),
        },
        Check {
            precondition: Precondition::min_rows("source", "source", "payments", 1),
            verdict: Verdict::Violated(Violation::Unreachable {
                cause: "connection refused".to_string(),
            }),
        },
    ])
}

#[test]
fn test_render_is_greppable_line_per_check() {
    let report = sample_result().render();
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(
        lines,
        vec![
            "warehouse.staging.customers: satisfied (5 rows)",
            "source: satisfied (reachable)",
            "warehouse.staging.orders: violated (empty table)",
            "source.source.payments: violated (unreachable: connection refused)",
        ]
    );
}

#[test]
fn test_timeout_and_minimum_detail_lines() {
    let timeout = Check {
        precondition: Precondition::min_rows("warehouse", "staging", "events", 1),
        verdict: Verdict::Violated(Violation::Timeout { limit_seconds: 30 }),
    };
    assert_eq!(
        timeout.render(),
        "warehouse.staging.events: violated (query timed out after 30s)"
    );

    let below = Check {
        precondition: Precondition::min_rows("warehouse", "staging", "events", 100),
        verdict: Verdict::Violated(Violation::BelowMinimum {
            observed: 7,
            min: 100,
        }),
    };
    assert_eq!(
        below.render(),
        "warehouse.staging.events: violated (row count 7 below minimum 100)"
    );
}

#[test]
fn test_json_report_shape() {
    let result = sample_result();
    let value: serde_json::Value = serde_json::to_value(&result).unwrap();

    assert!(value["id"].is_string());
    assert!(value["evaluated_at"].is_string());

    let checks = value["checks"].as_array().unwrap();
    assert_eq!(checks.len(), 4);

    // Satisfied verdict carries the observed count
    assert_eq!(checks[0]["verdict"]["satisfied"]["observed"], 5);
    assert_eq!(checks[0]["precondition"]["store"], "warehouse");

    // Violations are tagged by variant for programmatic branching
    assert_eq!(checks[2]["verdict"]["violated"], "empty");
    assert_eq!(
        checks[3]["verdict"]["violated"]["unreachable"]["cause"],
        "connection refused"
    );
}

#[test]
fn test_verdicts_compare_equal_across_invocations() {
    // GateResult ids differ per invocation, verdicts do not
    let first = sample_result();
    let second = sample_result();

    assert_ne!(first.id, second.id);
    assert_eq!(first.checks, second.checks);
}
