//! Typed views over the policy documents consumed by the decision components.
//!
//! These views are read leniently: a missing or mistyped field falls back to
//! the engine baseline. Structural correctness is the job of the validators
//! in [`crate::validation`]; the views only need to be total.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;
use crate::primitives::{
    DEFAULT_ESCALATION_FRAGILITY_SCORE, DEFAULT_FREEZE_FRAGILITY_SCORE,
    DEFAULT_LOW_USAGE_ADOPTION_RATIO, DEFAULT_TOP_N, DEFAULT_WEIGHT_FRAGILITY,
    DEFAULT_WEIGHT_MATURITY_GAP, DEFAULT_WEIGHT_VALUE_OPPORTUNITY,
};

// =============================================================================
// RELEASE GATE POLICY
// =============================================================================

/// Toggles for the blocking rules of the release gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardFailRules {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub block_frozen_feature_changes: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub block_missing_qa_security_mapping: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub block_open_research_triggers: Option<bool>,
}

/// Toggles for the non-blocking rules of the release gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRules {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub warn_escalated_fragility: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub warn_low_usage_without_activation_plan: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub warn_connector_certification_gap: Option<bool>,
}

/// Score thresholds shared by the release gate and the priority queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub freeze_fragility_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub escalation_fragility_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub low_usage_adoption_ratio: Option<f64>,
}

impl GateThresholds {
    #[must_use]
    pub fn freeze(&self) -> f64 {
        self.freeze_fragility_score
            .unwrap_or(DEFAULT_FREEZE_FRAGILITY_SCORE)
    }

    #[must_use]
    pub fn escalation(&self) -> f64 {
        self.escalation_fragility_score
            .unwrap_or(DEFAULT_ESCALATION_FRAGILITY_SCORE)
    }

    #[must_use]
    pub fn low_usage(&self) -> f64 {
        self.low_usage_adoption_ratio
            .unwrap_or(DEFAULT_LOW_USAGE_ADOPTION_RATIO)
    }
}

/// Operator override settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverridePolicy {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub allowed_roles: Vec<String>,
}

/// The `feature_release_gate_policy` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseGatePolicy {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub hard_fail_rules: Option<HardFailRules>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub advisory_rules: Option<AdvisoryRules>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub thresholds: Option<GateThresholds>,
    #[serde(default, rename = "override", deserialize_with = "lenient::optional")]
    pub override_policy: Option<OverridePolicy>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub required_reason_codes: Vec<String>,
}

impl ReleaseGatePolicy {
    /// Read the policy from an arbitrary JSON value. Never fails.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        lenient::from_value_or_default(value)
    }

    /// Thresholds with defaults applied for absent fields.
    #[must_use]
    pub fn thresholds(&self) -> GateThresholds {
        self.thresholds.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn hard_fail_rules(&self) -> HardFailRules {
        self.hard_fail_rules.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn advisory_rules(&self) -> AdvisoryRules {
        self.advisory_rules.clone().unwrap_or_default()
    }

    /// Whether operator overrides are switched on (only an explicit `true` counts).
    #[must_use]
    pub fn override_enabled(&self) -> bool {
        self.override_policy
            .as_ref()
            .and_then(|o| o.enabled)
            .unwrap_or(false)
    }
}

// =============================================================================
// DECISION POLICY
// =============================================================================

/// Weights of the three priority-score components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionWeights {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub fragility: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub maturity_gap: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub value_opportunity: Option<f64>,
}

/// Truncation lengths for the ranked buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopN {
    #[serde(default, deserialize_with = "lenient::whole")]
    pub risk: Option<u64>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub value: Option<u64>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub research: Option<u64>,
}

/// The `feature_decision_policy` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub weights: Option<DecisionWeights>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub top_n: Option<TopN>,
}

impl DecisionPolicy {
    /// Read the policy from an arbitrary JSON value. Never fails.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        lenient::from_value_or_default(value)
    }

    /// `(fragility, maturity_gap, value_opportunity)` with defaults applied.
    #[must_use]
    pub fn resolved_weights(&self) -> (f64, f64, f64) {
        let weights = self.weights.clone().unwrap_or_default();
        (
            weights.fragility.unwrap_or(DEFAULT_WEIGHT_FRAGILITY),
            weights.maturity_gap.unwrap_or(DEFAULT_WEIGHT_MATURITY_GAP),
            weights
                .value_opportunity
                .unwrap_or(DEFAULT_WEIGHT_VALUE_OPPORTUNITY),
        )
    }

    /// `(risk, value, research)` truncation lengths with defaults applied.
    #[must_use]
    pub fn resolved_top_n(&self) -> (usize, usize, usize) {
        let top_n = self.top_n.clone().unwrap_or_default();
        let pick = |n: Option<u64>| n.filter(|n| *n >= 1).map_or(DEFAULT_TOP_N, |n| n as usize);
        (pick(top_n.risk), pick(top_n.value), pick(top_n.research))
    }
}

// =============================================================================
// CADENCE POLICY
// =============================================================================

/// Settings of one recurring governance job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadenceJobPolicy {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub run_window_utc: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub max_staleness_hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub actions: Vec<String>,
}

/// The three cadence slots of the cadence policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadenceJobPolicies {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub daily: Option<CadenceJobPolicy>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub weekly: Option<CadenceJobPolicy>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub monthly: Option<CadenceJobPolicy>,
}

/// The `feature_operating_cadence` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadencePolicy {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub timezone: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub cadences: Option<CadenceJobPolicies>,
}

impl CadencePolicy {
    /// Read the policy from an arbitrary JSON value. Never fails.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        lenient::from_value_or_default(value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
