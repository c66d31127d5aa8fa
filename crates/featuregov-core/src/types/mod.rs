//! # Core Type Definitions
//!
//! This module contains the data model of the governance engine:
//! - Feature records and health snapshots (`Feature`, `FeatureHealthSnapshot`)
//! - Typed policy views (`ReleaseGatePolicy`, `DecisionPolicy`, `CadencePolicy`)
//!   and one record per remaining document kind, unified by `PolicyDocument`
//! - Operator and ledger records (`ResearchTriggerRecord`, `ReleaseGateOverride`,
//!   `OperatingRunRecord`)
//! - Error types (`GovernanceError`)
//!
//! ## Totality
//!
//! Every record decodes leniently: mistyped fields read as absent and the
//! accessors apply the engine baselines, so evaluation never stops on
//! partial input.

mod documents;
mod feature;
pub(crate) mod lenient;
mod policy;
mod records;

pub use documents::{
    ActivationCatalog, ActivationExperiment, CompactionSettings, ConnectorCertification,
    ConnectorCertificationMatrix, ConnectorSlo, ContextPolicy, DiscoveryIngestionQualityPolicy,
    DiscoveryQuality, GovernanceEvents, IngestionQuality, KnowledgeRetrievalPolicy, McpTrustPolicy,
    PolicyDocument, PromptCacheSettings, QueryConstraints, RetrievalFallback, RetrievalIndex,
    RetrievalSecurity, TierControls, TransportOverride, TransportPolicy,
};
pub use feature::{
    Feature, FeatureHealthSnapshot, FeatureRegistry, FeatureState, QaContracts, SecurityControls,
    UsageSignals,
};
pub use policy::{
    AdvisoryRules, CadenceJobPolicies, CadenceJobPolicy, CadencePolicy, DecisionPolicy,
    DecisionWeights, GateThresholds, HardFailRules, OverridePolicy, ReleaseGatePolicy, TopN,
};
pub use records::{OperatingRunRecord, ReleaseGateOverride, ResearchTriggerRecord};

use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised outside the engine's total entry points.
///
/// The decision components never return these; they surface from helpers
/// that decode raw text (ledger lines, policy kind names) and from the
/// binary's file and configuration handling.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Input text could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A policy kind or `_artifact` tag is not recognized.
    #[error("Unknown policy artifact: {0}")]
    UnknownArtifact(String),
}
