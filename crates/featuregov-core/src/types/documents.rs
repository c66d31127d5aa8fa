//! Typed records for every policy document, and the [`PolicyDocument`] union
//! keyed by `_artifact`.
//!
//! Like the decision-facing views in `policy.rs`, these records decode
//! leniently: they describe what a document says, not whether it is valid.
//! Validity is reported by [`crate::validation`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::lenient;
use super::{CadencePolicy, DecisionPolicy, GovernanceError, ReleaseGatePolicy};
use crate::validation::PolicyKind;

// =============================================================================
// CATALOGS
// =============================================================================

/// One activation experiment of the activation catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationExperiment {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub feature_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub jtbd: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub activation_hypothesis: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub success_metric: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub target_delta: Option<f64>,
}

/// The `feature_activation_catalog` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationCatalog {
    #[serde(default, deserialize_with = "lenient::list")]
    pub experiments: Vec<ActivationExperiment>,
}

impl ActivationCatalog {
    /// Experiment planned for the given feature, if any.
    #[must_use]
    pub fn experiment_for(&self, feature_id: &str) -> Option<&ActivationExperiment> {
        self.experiments
            .iter()
            .find(|e| e.feature_id.as_deref() == Some(feature_id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSlo {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub success_rate_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub p95_latency_ms_max: Option<u64>,
}

/// Certification requirements of one connector provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorCertification {
    #[serde(default, deserialize_with = "lenient::list")]
    pub required_checks: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub slo: Option<ConnectorSlo>,
}

/// The `connector_certification_matrix` document, keyed by provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorCertificationMatrix {
    #[serde(default, deserialize_with = "lenient::map")]
    pub providers: BTreeMap<String, ConnectorCertification>,
}

// =============================================================================
// TRANSPORT & CONTEXT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportOverride {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub fallback_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub max_parallel_sockets: Option<u64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub retry_on_transient_failure: Option<bool>,
}

/// The `transport_policy` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportPolicy {
    #[serde(default, deserialize_with = "lenient::list")]
    pub allowed_modes: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub default_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient::map")]
    pub provider_overrides: BTreeMap<String, TransportOverride>,
}

impl TransportPolicy {
    /// Transport mode for a provider: its override, else the default mode.
    #[must_use]
    pub fn mode_for(&self, provider: &str) -> Option<&str> {
        self.provider_overrides
            .get(provider)
            .and_then(|o| o.mode.as_deref())
            .or(self.default_mode.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactionSettings {
    #[serde(default, deserialize_with = "lenient::whole")]
    pub compact_threshold_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub post_compaction_target_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub preserve_sections: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptCacheSettings {
    #[serde(default, deserialize_with = "lenient::whole")]
    pub max_prefix_segments: Option<u64>,
}

/// The `context_policy` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextPolicy {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub compaction: Option<CompactionSettings>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub prompt_cache: Option<PromptCacheSettings>,
}

// =============================================================================
// KNOWLEDGE RETRIEVAL & DISCOVERY
// =============================================================================

/// `governance.{emit_events, reason_codes}` shared by several documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GovernanceEvents {
    #[serde(default, deserialize_with = "lenient::list")]
    pub emit_events: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub reason_codes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalIndex {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub allowed_ledgers: Vec<String>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub max_candidates: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConstraints {
    #[serde(default, deserialize_with = "lenient::whole")]
    pub max_query_length: Option<u64>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub max_top_k: Option<u64>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub max_context_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub min_similarity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub min_citation_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSecurity {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub redact_secrets: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub enforce_ledger_allowlist: Option<bool>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub blocked_pattern_refs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalFallback {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub on_empty_result: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub on_policy_violation: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub emit_governance_event: Option<bool>,
}

/// The `knowledge_retrieval_policy` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRetrievalPolicy {
    #[serde(default, deserialize_with = "lenient::list")]
    pub allowed_modes: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub default_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient::map")]
    pub indexes: BTreeMap<String, RetrievalIndex>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub query_constraints: Option<QueryConstraints>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub security: Option<RetrievalSecurity>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub fallback: Option<RetrievalFallback>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub governance: Option<GovernanceEvents>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryQuality {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub incremental_cursor_required: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub dedup_precision_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub false_positive_rate_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub entity_link_confidence_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub max_candidates_per_entity: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionQuality {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub idempotency_key_required: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub duplicate_suppression_rate_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub max_parse_error_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub pii_redaction_required: Option<bool>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub max_batch_latency_ms: Option<u64>,
}

/// The `discovery_ingestion_quality_policy` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryIngestionQualityPolicy {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub discovery: Option<DiscoveryQuality>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub ingestion: Option<IngestionQuality>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub governance: Option<GovernanceEvents>,
}

// =============================================================================
// MCP TRUST
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierControls {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub allow_write_tools: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub require_operator_approval: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub egress_logging_required: Option<bool>,
}

/// The `mcp_trust_policy` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpTrustPolicy {
    #[serde(default, deserialize_with = "lenient::list")]
    pub trust_tiers: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub default_trust_tier: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub tool_actions: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub default_tool_action: Option<String>,
    #[serde(default, deserialize_with = "lenient::map")]
    pub tier_controls: BTreeMap<String, TierControls>,
}

impl McpTrustPolicy {
    /// Controls for a tier, falling back to the default tier's controls.
    #[must_use]
    pub fn controls_for(&self, tier: &str) -> Option<&TierControls> {
        self.tier_controls.get(tier).or_else(|| {
            self.default_trust_tier
                .as_deref()
                .and_then(|default| self.tier_controls.get(default))
        })
    }
}

// =============================================================================
// POLICY DOCUMENT
// =============================================================================

/// Any governance policy document, one variant per `_artifact` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyDocument {
    OperatingCadence(CadencePolicy),
    ReleaseGate(ReleaseGatePolicy),
    Decision(DecisionPolicy),
    ActivationCatalog(ActivationCatalog),
    ConnectorCertificationMatrix(ConnectorCertificationMatrix),
    Transport(TransportPolicy),
    Context(ContextPolicy),
    KnowledgeRetrieval(KnowledgeRetrievalPolicy),
    DiscoveryIngestionQuality(DiscoveryIngestionQualityPolicy),
    McpTrust(McpTrustPolicy),
}

impl PolicyDocument {
    /// Decode a document by its own `_artifact` tag.
    ///
    /// Only the tag can fail; the body is read leniently.
    pub fn from_value(document: &Value) -> Result<Self, GovernanceError> {
        let artifact = document.get("_artifact").and_then(Value::as_str).unwrap_or("");
        let kind = PolicyKind::from_artifact(artifact)
            .ok_or_else(|| GovernanceError::UnknownArtifact(artifact.to_string()))?;
        Ok(Self::decode_as(kind, document))
    }

    /// Decode a document as the given kind, ignoring its `_artifact` tag.
    #[must_use]
    pub fn decode_as(kind: PolicyKind, document: &Value) -> Self {
        match kind {
            PolicyKind::OperatingCadence => Self::OperatingCadence(CadencePolicy::from_value(document)),
            PolicyKind::ReleaseGate => Self::ReleaseGate(ReleaseGatePolicy::from_value(document)),
            PolicyKind::Decision => Self::Decision(DecisionPolicy::from_value(document)),
            PolicyKind::ActivationCatalog => {
                Self::ActivationCatalog(lenient::from_value_or_default(document))
            }
            PolicyKind::ConnectorCertificationMatrix => {
                Self::ConnectorCertificationMatrix(lenient::from_value_or_default(document))
            }
            PolicyKind::Transport => Self::Transport(lenient::from_value_or_default(document)),
            PolicyKind::Context => Self::Context(lenient::from_value_or_default(document)),
            PolicyKind::KnowledgeRetrieval => {
                Self::KnowledgeRetrieval(lenient::from_value_or_default(document))
            }
            PolicyKind::DiscoveryIngestionQuality => {
                Self::DiscoveryIngestionQuality(lenient::from_value_or_default(document))
            }
            PolicyKind::McpTrust => Self::McpTrust(lenient::from_value_or_default(document)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::OperatingCadence(_) => PolicyKind::OperatingCadence,
            Self::ReleaseGate(_) => PolicyKind::ReleaseGate,
            Self::Decision(_) => PolicyKind::Decision,
            Self::ActivationCatalog(_) => PolicyKind::ActivationCatalog,
            Self::ConnectorCertificationMatrix(_) => PolicyKind::ConnectorCertificationMatrix,
            Self::Transport(_) => PolicyKind::Transport,
            Self::Context(_) => PolicyKind::Context,
            Self::KnowledgeRetrieval(_) => PolicyKind::KnowledgeRetrieval,
            Self::DiscoveryIngestionQuality(_) => PolicyKind::DiscoveryIngestionQuality,
            Self::McpTrust(_) => PolicyKind::McpTrust,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_kind_decodes_to_its_own_variant() {
        for kind in PolicyKind::ALL {
            let document = json!({"_artifact": kind.artifact(), "_config_version": 1});
            let decoded = PolicyDocument::from_value(&document).expect("known artifact");
            assert_eq!(decoded.kind(), kind);
        }
    }

    #[test]
    fn unknown_artifact_is_an_error() {
        let err = PolicyDocument::from_value(&json!({"_artifact": "feature_wishlist"}));
        assert!(matches!(err, Err(GovernanceError::UnknownArtifact(_))));
        assert!(PolicyDocument::from_value(&json!([1])).is_err());
    }

    #[test]
    fn transport_overrides_fall_back_to_default_mode() {
        let PolicyDocument::Transport(policy) = PolicyDocument::decode_as(
            PolicyKind::Transport,
            &json!({
                "allowed_modes": ["http", "websocket"],
                "default_mode": "http",
                "provider_overrides": {
                    "slack": {"mode": "websocket", "max_parallel_sockets": 4.0},
                    "broken": "not an object"
                }
            }),
        ) else {
            panic!("expected transport policy");
        };
        assert_eq!(policy.mode_for("slack"), Some("websocket"));
        assert_eq!(policy.mode_for("github"), Some("http"));
        assert_eq!(policy.provider_overrides["slack"].max_parallel_sockets, Some(4));
        assert!(!policy.provider_overrides.contains_key("broken"));
    }

    #[test]
    fn catalog_finds_experiment_by_feature() {
        let PolicyDocument::ActivationCatalog(catalog) = PolicyDocument::decode_as(
            PolicyKind::ActivationCatalog,
            &json!({"experiments": [
                {"feature_id": "builder_lane", "target_delta": 0.15},
                "junk"
            ]}),
        ) else {
            panic!("expected activation catalog");
        };
        assert_eq!(catalog.experiments.len(), 1);
        assert_eq!(
            catalog.experiment_for("builder_lane").and_then(|e| e.target_delta),
            Some(0.15)
        );
        assert!(catalog.experiment_for("connector_alpha").is_none());
    }

    #[test]
    fn trust_tier_controls_fall_back_to_default_tier() {
        let PolicyDocument::McpTrust(policy) = PolicyDocument::decode_as(
            PolicyKind::McpTrust,
            &json!({
                "trust_tiers": ["sandboxed", "trusted"],
                "default_trust_tier": "sandboxed",
                "tier_controls": {
                    "sandboxed": {"allow_write_tools": false, "require_operator_approval": true},
                    "trusted": {"allow_write_tools": true}
                }
            }),
        ) else {
            panic!("expected mcp trust policy");
        };
        assert_eq!(policy.controls_for("trusted").and_then(|c| c.allow_write_tools), Some(true));
        assert_eq!(
            policy.controls_for("unknown").and_then(|c| c.require_operator_approval),
            Some(true)
        );
    }

    #[test]
    fn retrieval_constraints_read_whole_numbers() {
        let PolicyDocument::KnowledgeRetrieval(policy) = PolicyDocument::decode_as(
            PolicyKind::KnowledgeRetrieval,
            &json!({
                "indexes": {"semantic": {"enabled": true, "max_candidates": 50}},
                "query_constraints": {"max_top_k": 8.0, "min_similarity": 0.35, "max_query_length": "long"}
            }),
        ) else {
            panic!("expected knowledge retrieval policy");
        };
        let constraints = policy.query_constraints.expect("constraints");
        assert_eq!(constraints.max_top_k, Some(8));
        assert_eq!(constraints.max_query_length, None);
        assert_eq!(policy.indexes["semantic"].max_candidates, Some(50));
    }
}
