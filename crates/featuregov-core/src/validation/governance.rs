//! Validators for the documents the decision components consume directly:
//! operating cadence, release gate and decision policy.

use serde_json::Value;

use super::checker::Checker;
use super::{IssueCode, PolicyKind, ValidationReport};
use crate::cadence::Cadence;
use crate::primitives::{MAX_STALENESS_HOURS_LIMIT, TOP_N_MAX, TOP_N_MIN, WEIGHT_SUM_TOLERANCE};
use crate::priority::Bucket;

const GATE_MODES: [&str; 2] = ["advisory", "hard"];

const HARD_FAIL_RULES: [&str; 3] = [
    "block_frozen_feature_changes",
    "block_missing_qa_security_mapping",
    "block_open_research_triggers",
];

const TOP_N_KEYS: [&str; 3] = ["risk", "value", "research"];

/// Validate a `feature_operating_cadence` document.
#[must_use]
pub fn validate_cadence_policy(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::OperatingCadence);

    c.string(&root, "timezone");
    if let Some(cadences) = c.object(&root, "cadences") {
        for cadence in Cadence::ALL {
            let Some(job) = c.object(&cadences, cadence.as_str()) else {
                continue;
            };
            c.boolean(&job, "enabled");
            c.string(&job, "owner");
            c.string(&job, "run_window_utc");
            c.integer(&job, "max_staleness_hours", 1, MAX_STALENESS_HOURS_LIMIT);
            c.list(&job, "actions");
        }
    }
    if let Some(escalation) = c.object(&root, "escalation") {
        c.string_list(&escalation, "notify_roles");
    }

    c.finish()
}

/// Validate a `feature_release_gate_policy` document.
#[must_use]
pub fn validate_release_gate_policy(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::ReleaseGate);

    c.one_of(&root, "mode", &GATE_MODES);
    if let Some(rules) = c.object(&root, "hard_fail_rules") {
        for rule in HARD_FAIL_RULES {
            c.boolean(&rules, rule);
        }
    }
    c.object(&root, "advisory_rules");
    if let Some(thresholds) = c.object(&root, "thresholds") {
        c.number(&thresholds, "freeze_fragility_score", 0.0, 100.0);
        c.number(&thresholds, "escalation_fragility_score", 0.0, 100.0);
        c.number(&thresholds, "low_usage_adoption_ratio", 0.0, 1.0);
    }
    if let Some(override_policy) = c.object(&root, "override") {
        c.boolean(&override_policy, "enabled");
        c.string_list(&override_policy, "allowed_roles");
    }
    c.string_list(&root, "required_reason_codes");

    c.finish()
}

/// Validate a `feature_decision_policy` document.
#[must_use]
pub fn validate_decision_policy(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::Decision);

    if let Some(weights) = c.object(&root, "weights") {
        let fragility = c.number(&weights, "fragility", 0.0, 1.0);
        let maturity = c.number(&weights, "maturity_gap", 0.0, 1.0);
        let value = c.number(&weights, "value_opportunity", 0.0, 1.0);
        if let (Some(fragility), Some(maturity), Some(value)) = (fragility, maturity, value) {
            let sum = fragility + maturity + value;
            if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                c.push(
                    IssueCode::WeightsSumInvalid,
                    "weights",
                    format!("weights must sum to 1.0 (±{WEIGHT_SUM_TOLERANCE}), got {sum}"),
                );
            }
        }
    }
    if let Some(buckets) = c.object(&root, "buckets") {
        for bucket in Bucket::ALL {
            let Some(spec) = c.object(&buckets, bucket.as_str()) else {
                continue;
            };
            c.number(&spec, "min_score", 0.0, 100.0);
            c.list(&spec, "conditions");
        }
    }
    if let Some(top_n) = c.object(&root, "top_n") {
        for key in TOP_N_KEYS {
            c.integer(&top_n, key, TOP_N_MIN, TOP_N_MAX);
        }
    }

    c.finish()
}

// =============================================================================
// TESTS
// =============================================================================
