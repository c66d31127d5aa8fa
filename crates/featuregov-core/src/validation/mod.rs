//! # Policy Validators
//!
//! Schema and invariant checks for the ten governance policy documents.
//!
//! ## Contract
//!
//! `validate(document) -> ValidationReport { ok, errors }`:
//! - never panics and never returns `Err`
//! - accumulates every violation instead of stopping at the first one
//! - the only early exit is a root that is not an object
//! - `_artifact` / `_config_version` problems are recorded, then nested
//!   validation continues anyway
//!
//! Each document kind is a [`PolicyKind`] variant, so adding a kind forces
//! the dispatch in [`PolicyKind::validate`] to cover it.

mod catalog;
mod checker;
mod governance;
mod runtime;

pub use catalog::{validate_activation_catalog, validate_connector_certification_matrix};
pub use governance::{validate_cadence_policy, validate_decision_policy, validate_release_gate_policy};
pub use runtime::{
    validate_context_policy, validate_discovery_ingestion_quality_policy,
    validate_knowledge_retrieval_policy, validate_mcp_trust_policy, validate_transport_policy,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::GovernanceError;

// =============================================================================
// ISSUES & REPORTS
// =============================================================================

/// Machine-readable category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    RootNotObject,
    ArtifactMismatch,
    ConfigVersionInvalid,
    UnknownArtifact,
    ObjectRequired,
    StringRequired,
    BooleanRequired,
    IntegerOutOfRange,
    NumberOutOfRange,
    ListRequired,
    ValueNotAllowed,
    WeightsSumInvalid,
}

impl IssueCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RootNotObject => "ROOT_NOT_OBJECT",
            Self::ArtifactMismatch => "ARTIFACT_MISMATCH",
            Self::ConfigVersionInvalid => "CONFIG_VERSION_INVALID",
            Self::UnknownArtifact => "UNKNOWN_ARTIFACT",
            Self::ObjectRequired => "OBJECT_REQUIRED",
            Self::StringRequired => "STRING_REQUIRED",
            Self::BooleanRequired => "BOOLEAN_REQUIRED",
            Self::IntegerOutOfRange => "INTEGER_OUT_OF_RANGE",
            Self::NumberOutOfRange => "NUMBER_OUT_OF_RANGE",
            Self::ListRequired => "LIST_REQUIRED",
            Self::ValueNotAllowed => "VALUE_NOT_ALLOWED",
            Self::WeightsSumInvalid => "WEIGHTS_SUM_INVALID",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    /// Dotted path of the offending field (`$` for the document root).
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    #[must_use]
    pub fn new(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Outcome of validating one policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    #[must_use]
    pub fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
        }
    }

    /// Whether any issue carries the given code.
    #[must_use]
    pub fn has(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }
}

// =============================================================================
// POLICY KINDS
// =============================================================================

/// The ten governance policy documents, one variant per `_artifact` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    OperatingCadence,
    ReleaseGate,
    Decision,
    ActivationCatalog,
    ConnectorCertificationMatrix,
    Transport,
    Context,
    KnowledgeRetrieval,
    DiscoveryIngestionQuality,
    McpTrust,
}

impl PolicyKind {
    /// Every kind, in a stable order.
    pub const ALL: [PolicyKind; 10] = [
        Self::OperatingCadence,
        Self::ReleaseGate,
        Self::Decision,
        Self::ActivationCatalog,
        Self::ConnectorCertificationMatrix,
        Self::Transport,
        Self::Context,
        Self::KnowledgeRetrieval,
        Self::DiscoveryIngestionQuality,
        Self::McpTrust,
    ];

    /// The `_artifact` discriminator carried by documents of this kind.
    #[must_use]
    pub fn artifact(self) -> &'static str {
        match self {
            Self::OperatingCadence => "feature_operating_cadence",
            Self::ReleaseGate => "feature_release_gate_policy",
            Self::Decision => "feature_decision_policy",
            Self::ActivationCatalog => "feature_activation_catalog",
            Self::ConnectorCertificationMatrix => "connector_certification_matrix",
            Self::Transport => "transport_policy",
            Self::Context => "context_policy",
            Self::KnowledgeRetrieval => "knowledge_retrieval_policy",
            Self::DiscoveryIngestionQuality => "discovery_ingestion_quality_policy",
            Self::McpTrust => "mcp_trust_policy",
        }
    }

    /// Short kebab-case name used on the command line.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            Self::OperatingCadence => "cadence",
            Self::ReleaseGate => "release-gate",
            Self::Decision => "decision",
            Self::ActivationCatalog => "activation-catalog",
            Self::ConnectorCertificationMatrix => "connector-certification-matrix",
            Self::Transport => "transport",
            Self::Context => "context",
            Self::KnowledgeRetrieval => "knowledge-retrieval",
            Self::DiscoveryIngestionQuality => "discovery-ingestion-quality",
            Self::McpTrust => "mcp-trust",
        }
    }

    /// Kind whose `_artifact` tag equals `artifact`.
    #[must_use]
    pub fn from_artifact(artifact: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.artifact() == artifact)
    }

    /// Validate a document as this kind.
    #[must_use]
    pub fn validate(self, document: &Value) -> ValidationReport {
        match self {
            Self::OperatingCadence => validate_cadence_policy(document),
            Self::ReleaseGate => validate_release_gate_policy(document),
            Self::Decision => validate_decision_policy(document),
            Self::ActivationCatalog => validate_activation_catalog(document),
            Self::ConnectorCertificationMatrix => validate_connector_certification_matrix(document),
            Self::Transport => validate_transport_policy(document),
            Self::Context => validate_context_policy(document),
            Self::KnowledgeRetrieval => validate_knowledge_retrieval_policy(document),
            Self::DiscoveryIngestionQuality => validate_discovery_ingestion_quality_policy(document),
            Self::McpTrust => validate_mcp_trust_policy(document),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for PolicyKind {
    type Err = GovernanceError;

    /// Accepts either the short name (`release-gate`) or the artifact tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.short_name() == s || kind.artifact() == s)
            .ok_or_else(|| GovernanceError::UnknownArtifact(s.to_string()))
    }
}

/// Validate a document according to its own `_artifact` tag.
#[must_use]
pub fn validate_document(document: &Value) -> ValidationReport {
    let Some(map) = document.as_object() else {
        return ValidationReport::from_issues(vec![ValidationIssue::new(
            IssueCode::RootNotObject,
            "$",
            "policy document must be an object",
        )]);
    };
    let artifact = map.get("_artifact").and_then(Value::as_str);
    match artifact.and_then(PolicyKind::from_artifact) {
        Some(kind) => kind.validate(document),
        None => ValidationReport::from_issues(vec![ValidationIssue::new(
            IssueCode::UnknownArtifact,
            "_artifact",
            format!("unrecognized _artifact {:?}", artifact.unwrap_or("<missing>")),
        )]),
    }
}

// =============================================================================
// TESTS
// =============================================================================
