//! # Release Gate
//!
//! Decides whether a set of changed features may ship.
//!
//! ## Rules
//!
//! Hard-fail rules produce violations; advisory rules produce warnings. Every
//! rule is applied only when its policy toggle is literally `true`.
//!
//! | Rule | Kind | Fires when |
//! |------|------|------------|
//! | `FROZEN_FEATURE_CHANGE_BLOCKED` | hard | fragility >= freeze threshold |
//! | `MISSING_QA_SECURITY_MAPPING` | hard | a QA or security list is empty |
//! | `OPEN_RESEARCH_TRIGGER_BLOCKED` | hard | a trigger with a parseable timestamp exists |
//! | `ESCALATED_FRAGILITY_WARNING` | advisory | fragility >= escalation threshold |
//! | `LOW_USAGE_WITHOUT_ACTIVATION_PLAN` | advisory | adoption <= low-usage threshold |
//! | `CONNECTOR_CERTIFICATION_GAP` | advisory | plane is `connector` |
//!
//! A changed id missing from the snapshot yields `FEATURE_NOT_IN_HEALTH_SNAPSHOT`
//! as a warning and no other checks.
//!
//! ## Outcome
//!
//! The mode is `hard` only when the policy says exactly `"hard"`; anything
//! else evaluates as `advisory`. Advisory mode always passes. Hard mode passes
//! when nothing blocks or an override is accepted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{
    Feature, FeatureHealthSnapshot, ReleaseGateOverride, ReleaseGatePolicy, ResearchTriggerRecord,
};

// =============================================================================
// MODES & FINDINGS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    Advisory,
    Hard,
}

impl GateMode {
    /// Mode declared by a policy; anything but the literal `"hard"` is advisory.
    #[must_use]
    pub fn from_policy(policy: &ReleaseGatePolicy) -> Self {
        if policy.mode.as_deref() == Some("hard") {
            Self::Hard
        } else {
            Self::Advisory
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Advisory => "advisory",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for GateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    FeatureNotInHealthSnapshot,
    FrozenFeatureChangeBlocked,
    MissingQaSecurityMapping,
    OpenResearchTriggerBlocked,
    EscalatedFragilityWarning,
    LowUsageWithoutActivationPlan,
    ConnectorCertificationGap,
}

impl FindingCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeatureNotInHealthSnapshot => "FEATURE_NOT_IN_HEALTH_SNAPSHOT",
            Self::FrozenFeatureChangeBlocked => "FROZEN_FEATURE_CHANGE_BLOCKED",
            Self::MissingQaSecurityMapping => "MISSING_QA_SECURITY_MAPPING",
            Self::OpenResearchTriggerBlocked => "OPEN_RESEARCH_TRIGGER_BLOCKED",
            Self::EscalatedFragilityWarning => "ESCALATED_FRAGILITY_WARNING",
            Self::LowUsageWithoutActivationPlan => "LOW_USAGE_WITHOUT_ACTIVATION_PLAN",
            Self::ConnectorCertificationGap => "CONNECTOR_CERTIFICATION_GAP",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A violation or warning raised for one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateFinding {
    pub code: FindingCode,
    pub feature_id: String,
    pub message: String,
}

impl GateFinding {
    fn new(code: FindingCode, feature_id: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            feature_id: feature_id.to_string(),
            message: message.into(),
        }
    }
}

/// What happened to the operator override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideOutcome {
    pub requested: bool,
    pub accepted: bool,
    /// Set only when the override was accepted.
    pub reason_code: Option<String>,
    /// Set only when the override was accepted.
    pub ticket_ref: Option<String>,
}

/// Result of one release gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseGateResult {
    pub mode: GateMode,
    /// Final decision after the override is applied.
    pub pass: bool,
    /// Whether any hard-fail rule fired, ignoring mode and override.
    pub would_block: bool,
    pub changed_feature_ids: Vec<String>,
    pub violations: Vec<GateFinding>,
    pub warnings: Vec<GateFinding>,
    #[serde(rename = "override")]
    pub override_outcome: OverrideOutcome,
}

impl ReleaseGateResult {
    /// Whether a hard-mode gate is refusing the change.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        !self.pass
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

/// Evaluate the release gate for the given changed feature ids.
///
/// Duplicate ids are evaluated once, in first-seen order.
#[must_use]
pub fn evaluate_feature_release_gate(
    policy: &ReleaseGatePolicy,
    snapshot: &FeatureHealthSnapshot,
    changed_feature_ids: &[String],
    research_triggers: &[ResearchTriggerRecord],
    override_request: Option<&ReleaseGateOverride>,
) -> ReleaseGateResult {
    let mode = GateMode::from_policy(policy);
    let mut changed: Vec<String> = Vec::with_capacity(changed_feature_ids.len());
    for id in changed_feature_ids {
        if !changed.contains(id) {
            changed.push(id.clone());
        }
    }

    let mut violations = Vec::new();
    let mut warnings = Vec::new();
    for id in &changed {
        match snapshot.find(id) {
            Some(feature) => {
                check_hard_rules(policy, feature, research_triggers, &mut violations);
                check_advisory_rules(policy, feature, &mut warnings);
            }
            None => warnings.push(GateFinding::new(
                FindingCode::FeatureNotInHealthSnapshot,
                id,
                format!("feature {id} is not present in the latest health snapshot"),
            )),
        }
    }

    let would_block = !violations.is_empty();
    let override_outcome = resolve_override(policy, mode, would_block, override_request);
    let pass = match mode {
        GateMode::Advisory => true,
        GateMode::Hard => !would_block || override_outcome.accepted,
    };

    tracing::debug!(
        mode = %mode,
        pass,
        would_block,
        violations = violations.len(),
        warnings = warnings.len(),
        override_accepted = override_outcome.accepted,
        "release gate evaluated"
    );

    ReleaseGateResult {
        mode,
        pass,
        would_block,
        changed_feature_ids: changed,
        violations,
        warnings,
        override_outcome,
    }
}

fn check_hard_rules(
    policy: &ReleaseGatePolicy,
    feature: &Feature,
    research_triggers: &[ResearchTriggerRecord],
    violations: &mut Vec<GateFinding>,
) {
    let rules = policy.hard_fail_rules();
    let thresholds = policy.thresholds();
    let id = feature.id();

    if rules.block_frozen_feature_changes == Some(true) && feature.fragility() >= thresholds.freeze() {
        violations.push(GateFinding::new(
            FindingCode::FrozenFeatureChangeBlocked,
            id,
            format!(
                "fragility {} is at or above freeze threshold {}",
                feature.fragility(),
                thresholds.freeze()
            ),
        ));
    }

    if rules.block_missing_qa_security_mapping == Some(true) {
        let missing = feature.missing_mappings();
        if !missing.is_empty() {
            violations.push(GateFinding::new(
                FindingCode::MissingQaSecurityMapping,
                id,
                format!("missing mappings: {}", missing.join(", ")),
            ));
        }
    }

    if rules.block_open_research_triggers == Some(true)
        && research_triggers.iter().any(|trigger| trigger.is_open_for(id))
    {
        violations.push(GateFinding::new(
            FindingCode::OpenResearchTriggerBlocked,
            id,
            "an open research trigger exists for this feature",
        ));
    }
}

fn check_advisory_rules(policy: &ReleaseGatePolicy, feature: &Feature, warnings: &mut Vec<GateFinding>) {
    let rules = policy.advisory_rules();
    let thresholds = policy.thresholds();
    let id = feature.id();

    if rules.warn_escalated_fragility == Some(true) && feature.fragility() >= thresholds.escalation() {
        warnings.push(GateFinding::new(
            FindingCode::EscalatedFragilityWarning,
            id,
            format!(
                "fragility {} is at or above escalation threshold {}",
                feature.fragility(),
                thresholds.escalation()
            ),
        ));
    }

    if rules.warn_low_usage_without_activation_plan == Some(true)
        && feature.adoption() <= thresholds.low_usage()
    {
        warnings.push(GateFinding::new(
            FindingCode::LowUsageWithoutActivationPlan,
            id,
            format!(
                "adoption {} is at or below low-usage threshold {}",
                feature.adoption(),
                thresholds.low_usage()
            ),
        ));
    }

    if rules.warn_connector_certification_gap == Some(true) && feature.is_connector() {
        warnings.push(GateFinding::new(
            FindingCode::ConnectorCertificationGap,
            id,
            "connector change requires certification matrix review",
        ));
    }
}

/// Accept the override only when every precondition holds.
fn resolve_override(
    policy: &ReleaseGatePolicy,
    mode: GateMode,
    would_block: bool,
    request: Option<&ReleaseGateOverride>,
) -> OverrideOutcome {
    let Some(request) = request else {
        return OverrideOutcome::default();
    };

    let reason_code = request.reason_code.as_deref().map(str::trim).unwrap_or("");
    let ticket_ref = request.ticket_ref.as_deref().map(str::trim).unwrap_or("");
    let reason_allowed = policy
        .required_reason_codes
        .iter()
        .any(|code| code == reason_code);

    let accepted = would_block
        && mode == GateMode::Hard
        && policy.override_enabled()
        && reason_allowed
        && !ticket_ref.is_empty();

    if !accepted {
        tracing::debug!(reason_code, would_block, mode = %mode, "override rejected");
        return OverrideOutcome {
            requested: true,
            ..OverrideOutcome::default()
        };
    }

    tracing::info!(reason_code, ticket_ref, "release gate override accepted");
    OverrideOutcome {
        requested: true,
        accepted: true,
        reason_code: Some(reason_code.to_string()),
        ticket_ref: Some(ticket_ref.to_string()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
