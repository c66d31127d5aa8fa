//! # featuregov-core
//!
//! The feature-governance decision engine - THE LOGIC.
//!
//! Given policy documents, the latest feature-health snapshot and a set of
//! changed paths, this crate answers four questions:
//! - is each policy document well formed? (`validation`)
//! - which features does a change touch? (`resolver`)
//! - may the change ship? (`gate`)
//! - what should the team work on next, and are the governance jobs fresh?
//!   (`priority`, `cadence`)
//!
//! ## Architectural Constraints
//!
//! - Every entry point is a pure function over explicit inputs
//! - No I/O, no global state, no async (file access lives in the app layer)
//! - Malformed input never errors: missing fields fall back to baselines and
//!   problems are returned as data

// =============================================================================
// MODULES
// =============================================================================

pub mod cadence;
pub mod formats;
pub mod gate;
pub mod primitives;
pub mod priority;
pub mod resolver;
pub mod timestamp;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AdvisoryRules, CadenceJobPolicies, CadenceJobPolicy, CadencePolicy, DecisionPolicy,
    DecisionWeights, Feature, FeatureHealthSnapshot, FeatureRegistry, FeatureState,
    GateThresholds, GovernanceError, HardFailRules, OperatingRunRecord, OverridePolicy,
    PolicyDocument, QaContracts, ReleaseGateOverride, ReleaseGatePolicy, ResearchTriggerRecord,
    SecurityControls, TopN, UsageSignals,
};

// =============================================================================
// RE-EXPORTS: Decision Components
// =============================================================================

pub use cadence::{
    Cadence, CadenceJobStatus, CadenceJobs, OperatingCadenceStatus, build_feature_operating_status,
};
pub use gate::{
    FindingCode, GateFinding, GateMode, OverrideOutcome, ReleaseGateResult,
    evaluate_feature_release_gate,
};
pub use priority::{
    Bucket, FeaturePriorityReport, PriorityQueue, PriorityQueueEntry, PriorityTotals,
    assign_bucket, build_feature_priority_queue, score_feature,
};
pub use resolver::{ChangeResolver, resolve_changed_feature_ids};

// =============================================================================
// RE-EXPORTS: Validation
// =============================================================================

pub use validation::{
    IssueCode, PolicyKind, ValidationIssue, ValidationReport, validate_activation_catalog,
    validate_cadence_policy, validate_connector_certification_matrix, validate_context_policy,
    validate_decision_policy, validate_discovery_ingestion_quality_policy, validate_document,
    validate_knowledge_retrieval_policy, validate_mcp_trust_policy, validate_release_gate_policy,
    validate_transport_policy,
};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{decode_ledger_line, parse_ledger};
