//! Feature records, health snapshots and the feature registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;
use crate::primitives::{MAX_FRAGILITY_SCORE, MAX_MATURITY_SCORE};

// =============================================================================
// FEATURE
// =============================================================================

/// Trailing 30-day usage signals of a feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSignals {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub invocation_count_30d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub adoption_ratio_30d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub success_rate_30d: Option<f64>,
}

/// QA contracts mapped to a feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaContracts {
    #[serde(default, deserialize_with = "lenient::list")]
    pub test_suites: Vec<Value>,
}

/// Security controls mapped to a feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityControls {
    #[serde(default, deserialize_with = "lenient::list")]
    pub policy_refs: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub owasp_llm_top10: Vec<Value>,
}

/// Flags precomputed upstream by the health-snapshot job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureState {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub freeze: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub escalation: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub research_required: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub low_usage: Option<bool>,
}

/// A governed capability unit.
///
/// Every field is optional on the wire. The accessor methods apply the
/// engine's baselines: absent fragility reads as 0, absent maturity as 0,
/// absent adoption as 1 (fully adopted) and absent invocations as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub feature_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub plane: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub lifecycle_state: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub fragility_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub maturity_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub usage_signals: Option<UsageSignals>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub qa_contracts: Option<QaContracts>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub security_controls: Option<SecurityControls>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub state: Option<FeatureState>,
}

impl Feature {
    /// Create a feature with only an identifier set.
    #[must_use]
    pub fn new(feature_id: impl Into<String>) -> Self {
        Self {
            feature_id: Some(feature_id.into()),
            ..Self::default()
        }
    }

    /// The feature identifier, or an empty string when absent.
    #[must_use]
    pub fn id(&self) -> &str {
        self.feature_id.as_deref().unwrap_or("")
    }

    /// Raw fragility score (absent reads as 0).
    #[must_use]
    pub fn fragility(&self) -> f64 {
        self.fragility_score.unwrap_or(0.0)
    }

    /// Raw maturity score (absent reads as 0).
    #[must_use]
    pub fn maturity(&self) -> f64 {
        self.maturity_score.unwrap_or(0.0)
    }

    /// Raw 30-day adoption ratio (absent reads as 1).
    #[must_use]
    pub fn adoption(&self) -> f64 {
        self.usage_signals
            .as_ref()
            .and_then(|u| u.adoption_ratio_30d)
            .unwrap_or(1.0)
    }

    /// Raw 30-day invocation count (absent reads as 0).
    #[must_use]
    pub fn invocations(&self) -> f64 {
        self.usage_signals
            .as_ref()
            .and_then(|u| u.invocation_count_30d)
            .unwrap_or(0.0)
    }

    /// Fragility clamped to `[0, 100]`.
    #[must_use]
    pub fn clamped_fragility(&self) -> f64 {
        self.fragility().clamp(0.0, MAX_FRAGILITY_SCORE)
    }

    /// Maturity clamped to `[0, 5]`.
    #[must_use]
    pub fn clamped_maturity(&self) -> f64 {
        self.maturity().clamp(0.0, MAX_MATURITY_SCORE)
    }

    /// Adoption clamped to `[0, 1]`.
    #[must_use]
    pub fn clamped_adoption(&self) -> f64 {
        self.adoption().clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn is_connector(&self) -> bool {
        self.plane.as_deref() == Some("connector")
    }

    #[must_use]
    pub fn is_proposed(&self) -> bool {
        self.lifecycle_state.as_deref() == Some("proposed")
    }

    /// Whether the upstream snapshot flagged this feature for research.
    #[must_use]
    pub fn research_required(&self) -> bool {
        self.state
            .as_ref()
            .and_then(|s| s.research_required)
            .unwrap_or(false)
    }

    /// Names of the QA/security mappings that are empty for this feature.
    #[must_use]
    pub fn missing_mappings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.qa_contracts.as_ref().is_none_or(|qa| qa.test_suites.is_empty()) {
            missing.push("qa_contracts.test_suites");
        }
        let security = self.security_controls.as_ref();
        if security.is_none_or(|s| s.policy_refs.is_empty()) {
            missing.push("security_controls.policy_refs");
        }
        if security.is_none_or(|s| s.owasp_llm_top10.is_empty()) {
            missing.push("security_controls.owasp_llm_top10");
        }
        missing
    }
}

// =============================================================================
// SNAPSHOT & REGISTRY
// =============================================================================

/// One entry of the feature-health ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureHealthSnapshot {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub generated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub features: Vec<Feature>,
}

impl FeatureHealthSnapshot {
    /// Create a snapshot from a list of features.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            generated_at: None,
            features,
        }
    }

    /// Read a snapshot from an arbitrary JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        lenient::from_value_or_default(value)
    }

    /// First feature carrying the given identifier.
    #[must_use]
    pub fn find(&self, feature_id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id() == feature_id)
    }
}

/// The feature registry consumed by the change resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRegistry {
    #[serde(default, deserialize_with = "lenient::list")]
    pub features: Vec<Feature>,
}

impl FeatureRegistry {
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Read a registry from an arbitrary JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        lenient::from_value_or_default(value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
