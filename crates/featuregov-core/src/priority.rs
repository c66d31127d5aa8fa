//! # Priority Queue
//!
//! Scores every feature of a health snapshot and sorts it into one of four
//! operating buckets.
//!
//! ## Scoring
//!
//! ```text
//! maturity_gap      = (5 - maturity) / 5 * 100
//! value_opportunity = (1 - adoption) * 100
//! score = fragility * w_fragility + maturity_gap * w_maturity + value_opportunity * w_value
//! ```
//!
//! Inputs are clamped first (fragility to `[0, 100]`, maturity to `[0, 5]`,
//! adoption to `[0, 1]`), so the score always lies in `[0, 100]` when the
//! weights sum to one.
//!
//! ## Bucketing
//!
//! An ordered decision list, first match wins. Unbuilt roadmap placeholders
//! (proposed, maturity 0, no invocations) go to the backlog before any risk
//! rule is consulted.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::primitives::{MAX_MATURITY_SCORE, RISK_SCORE_FLOOR};
use crate::types::{DecisionPolicy, Feature, FeatureHealthSnapshot, GateThresholds};

// =============================================================================
// BUCKETS
// =============================================================================

/// Operating posture assigned to a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bucket {
    RiskRemediationNow,
    ValueActivationNow,
    ResearchBeforeBuild,
    BacklogMonitor,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Self::RiskRemediationNow,
        Self::ValueActivationNow,
        Self::ResearchBeforeBuild,
        Self::BacklogMonitor,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RiskRemediationNow => "RISK_REMEDIATION_NOW",
            Self::ValueActivationNow => "VALUE_ACTIVATION_NOW",
            Self::ResearchBeforeBuild => "RESEARCH_BEFORE_BUILD",
            Self::BacklogMonitor => "BACKLOG_MONITOR",
        }
    }

    /// Fixed next step attached to every entry of this bucket.
    #[must_use]
    pub fn recommended_action(self) -> &'static str {
        match self {
            Self::RiskRemediationNow => "stabilize-and-reduce-fragility",
            Self::ValueActivationNow => "run-activation-experiment",
            Self::ResearchBeforeBuild => "perform-targeted-research-delta",
            Self::BacklogMonitor => "monitor-in-backlog",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// One ranked feature.
///
/// `score` is rounded to two decimals; ranking uses the unrounded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityQueueEntry {
    pub feature_id: String,
    pub name: Option<String>,
    pub plane: Option<String>,
    pub bucket: Bucket,
    pub score: f64,
    pub fragility_score: f64,
    pub maturity_score: f64,
    pub adoption_ratio_30d: f64,
    pub recommended_action: String,
}

/// Feature count plus per-bucket counts taken before truncation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityTotals {
    pub features: usize,
    pub risk: usize,
    pub value: usize,
    pub research: usize,
    pub backlog: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityQueue {
    pub risk: Vec<PriorityQueueEntry>,
    pub value: Vec<PriorityQueueEntry>,
    pub research: Vec<PriorityQueueEntry>,
    pub backlog: Vec<PriorityQueueEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeaturePriorityReport {
    pub totals: PriorityTotals,
    pub queue: PriorityQueue,
}

// =============================================================================
// SCORING
// =============================================================================

/// Weighted priority score of one feature, in `[0, 100]` for unit weights.
#[must_use]
pub fn score_feature(feature: &Feature, weights: (f64, f64, f64)) -> f64 {
    let (w_fragility, w_maturity, w_value) = weights;
    let maturity_gap = (MAX_MATURITY_SCORE - feature.clamped_maturity()) / MAX_MATURITY_SCORE * 100.0;
    let value_opportunity = (1.0 - feature.clamped_adoption()) * 100.0;
    feature.clamped_fragility() * w_fragility + maturity_gap * w_maturity + value_opportunity * w_value
}

/// Bucket for a feature with the given score.
#[must_use]
pub fn assign_bucket(feature: &Feature, score: f64, thresholds: &GateThresholds) -> Bucket {
    let fragility = feature.clamped_fragility();
    let maturity = feature.clamped_maturity();
    let adoption = feature.clamped_adoption();

    if feature.is_proposed() && maturity == 0.0 && feature.invocations() == 0.0 {
        Bucket::BacklogMonitor
    } else if fragility >= thresholds.freeze() {
        Bucket::RiskRemediationNow
    } else if feature.research_required() || maturity <= 2.0 {
        Bucket::ResearchBeforeBuild
    } else if adoption <= thresholds.low_usage() && maturity >= 3.0 {
        Bucket::ValueActivationNow
    } else if score >= RISK_SCORE_FLOOR {
        Bucket::RiskRemediationNow
    } else {
        Bucket::BacklogMonitor
    }
}

// =============================================================================
// QUEUE
// =============================================================================

struct Ranked<'a> {
    feature: &'a Feature,
    score: f64,
}

impl Ranked<'_> {
    fn into_entry(self, bucket: Bucket) -> PriorityQueueEntry {
        let feature = self.feature;
        PriorityQueueEntry {
            feature_id: feature.id().to_string(),
            name: feature.name.clone(),
            plane: feature.plane.clone(),
            bucket,
            score: round2(self.score),
            fragility_score: feature.clamped_fragility(),
            maturity_score: feature.clamped_maturity(),
            adoption_ratio_30d: feature.clamped_adoption(),
            recommended_action: bucket.recommended_action().to_string(),
        }
    }
}

/// Build the four-bucket priority queue for a snapshot.
///
/// Features without a `feature_id` are skipped. Ranked buckets are sorted by
/// descending score (ties by ascending id) and truncated to the policy's
/// `top_n`; the backlog is sorted the same way but never truncated.
#[must_use]
pub fn build_feature_priority_queue(
    snapshot: &FeatureHealthSnapshot,
    policy: &DecisionPolicy,
    thresholds: &GateThresholds,
) -> FeaturePriorityReport {
    let weights = policy.resolved_weights();
    let (top_risk, top_value, top_research) = policy.resolved_top_n();

    let mut risk = Vec::new();
    let mut value = Vec::new();
    let mut research = Vec::new();
    let mut backlog = Vec::new();

    for feature in &snapshot.features {
        if feature.id().is_empty() {
            tracing::debug!("skipping feature without feature_id");
            continue;
        }
        let score = score_feature(feature, weights);
        let ranked = Ranked { feature, score };
        match assign_bucket(feature, score, thresholds) {
            Bucket::RiskRemediationNow => risk.push(ranked),
            Bucket::ValueActivationNow => value.push(ranked),
            Bucket::ResearchBeforeBuild => research.push(ranked),
            Bucket::BacklogMonitor => backlog.push(ranked),
        }
    }

    let totals = PriorityTotals {
        features: risk.len() + value.len() + research.len() + backlog.len(),
        risk: risk.len(),
        value: value.len(),
        research: research.len(),
        backlog: backlog.len(),
    };
    tracing::debug!(
        features = totals.features,
        risk = totals.risk,
        value = totals.value,
        research = totals.research,
        backlog = totals.backlog,
        "priority queue built"
    );

    FeaturePriorityReport {
        totals,
        queue: PriorityQueue {
            risk: finish(risk, Bucket::RiskRemediationNow, Some(top_risk)),
            value: finish(value, Bucket::ValueActivationNow, Some(top_value)),
            research: finish(research, Bucket::ResearchBeforeBuild, Some(top_research)),
            backlog: finish(backlog, Bucket::BacklogMonitor, None),
        },
    }
}

fn finish(mut ranked: Vec<Ranked<'_>>, bucket: Bucket, limit: Option<usize>) -> Vec<PriorityQueueEntry> {
    ranked.sort_by(by_score_then_id);
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked.into_iter().map(|r| r.into_entry(bucket)).collect()
}

fn by_score_then_id(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.feature.id().cmp(b.feature.id()))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(value: serde_json::Value) -> Feature {
        serde_json::from_value(value).expect("feature")
    }

    fn defaults() -> (DecisionPolicy, GateThresholds) {
        (DecisionPolicy::default(), GateThresholds::default())
    }

    #[test]
    fn score_uses_clamped_inputs() {
        let f = feature(json!({
            "feature_id": "x",
            "fragility_score": 150,
            "maturity_score": 0,
            "usage_signals": {"adoption_ratio_30d": -1}
        }));
        assert_eq!(score_feature(&f, (0.4, 0.3, 0.3)), 100.0);
    }

    #[test]
    fn proposed_placeholder_beats_fragility() {
        let f = feature(json!({
            "feature_id": "future_multi_user",
            "lifecycle_state": "proposed",
            "maturity_score": 0,
            "fragility_score": 95,
            "usage_signals": {"invocation_count_30d": 0}
        }));
        let (_, thresholds) = defaults();
        assert_eq!(assign_bucket(&f, 99.0, &thresholds), Bucket::BacklogMonitor);
    }

    #[test]
    fn proposed_with_usage_is_not_exempt() {
        let f = feature(json!({
            "feature_id": "early",
            "lifecycle_state": "proposed",
            "maturity_score": 0,
            "fragility_score": 95,
            "usage_signals": {"invocation_count_30d": 4}
        }));
        let (_, thresholds) = defaults();
        assert_eq!(assign_bucket(&f, 0.0, &thresholds), Bucket::RiskRemediationNow);
    }

    #[test]
    fn decision_list_order() {
        let (_, thresholds) = defaults();
        let research = feature(json!({"feature_id": "r", "maturity_score": 4, "state": {"research_required": true}}));
        assert_eq!(assign_bucket(&research, 0.0, &thresholds), Bucket::ResearchBeforeBuild);

        let immature = feature(json!({"feature_id": "i", "maturity_score": 2}));
        assert_eq!(assign_bucket(&immature, 0.0, &thresholds), Bucket::ResearchBeforeBuild);

        let unused = feature(json!({"feature_id": "u", "maturity_score": 3, "usage_signals": {"adoption_ratio_30d": 0.1}}));
        assert_eq!(assign_bucket(&unused, 0.0, &thresholds), Bucket::ValueActivationNow);

        let hot = feature(json!({"feature_id": "h", "maturity_score": 4}));
        assert_eq!(assign_bucket(&hot, 75.0, &thresholds), Bucket::RiskRemediationNow);
        assert_eq!(assign_bucket(&hot, 74.99, &thresholds), Bucket::BacklogMonitor);
    }

    #[test]
    fn ranked_buckets_truncate_and_backlog_does_not() {
        let features: Vec<Feature> = (0..6)
            .map(|i| feature(json!({"feature_id": format!("risky_{i}"), "fragility_score": 70 + i, "maturity_score": 4})))
            .chain((0..6).map(|i| feature(json!({"feature_id": format!("calm_{i}"), "fragility_score": i, "maturity_score": 5}))))
            .collect();
        let policy = DecisionPolicy::from_value(&json!({"top_n": {"risk": 2, "value": 2, "research": 2}}));
        let report = build_feature_priority_queue(&FeatureHealthSnapshot::new(features), &policy, &GateThresholds::default());

        assert_eq!(report.totals.features, 12);
        assert_eq!(report.totals.risk, 6);
        assert_eq!(report.queue.risk.len(), 2);
        assert_eq!(report.queue.risk[0].feature_id, "risky_5");
        assert_eq!(report.queue.backlog.len(), 6);
        assert!(report.queue.backlog.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ties_break_on_feature_id() {
        let features = vec![
            feature(json!({"feature_id": "beta", "fragility_score": 80, "maturity_score": 4})),
            feature(json!({"feature_id": "alpha", "fragility_score": 80, "maturity_score": 4})),
        ];
        let (policy, thresholds) = defaults();
        let report = build_feature_priority_queue(&FeatureHealthSnapshot::new(features), &policy, &thresholds);
        let ids: Vec<&str> = report.queue.risk.iter().map(|e| e.feature_id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[test]
    fn entries_carry_action_and_rounded_score() {
        let features = vec![feature(json!({
            "feature_id": "odd",
            "fragility_score": 33.333,
            "maturity_score": 5,
            "usage_signals": {"adoption_ratio_30d": 1}
        }))];
        let (policy, thresholds) = defaults();
        let report = build_feature_priority_queue(&FeatureHealthSnapshot::new(features), &policy, &thresholds);
        let entry = &report.queue.backlog[0];
        assert_eq!(entry.recommended_action, "monitor-in-backlog");
        assert_eq!(entry.score, 13.33);
    }

    #[test]
    fn features_without_id_are_not_counted() {
        let features = vec![Feature::default(), Feature::new("real")];
        let (policy, thresholds) = defaults();
        let report = build_feature_priority_queue(&FeatureHealthSnapshot::new(features), &policy, &thresholds);
        assert_eq!(report.totals.features, 1);
    }

    #[test]
    fn integral_float_top_n_still_truncates() {
        let bucket = json!({"min_score": 0, "conditions": ["ordered decision list"]});
        let document = json!({
            "_artifact": "feature_decision_policy",
            "_config_version": 1,
            "weights": {"fragility": 0.4, "maturity_gap": 0.3, "value_opportunity": 0.3},
            "buckets": {
                "RISK_REMEDIATION_NOW": bucket,
                "VALUE_ACTIVATION_NOW": bucket,
                "RESEARCH_BEFORE_BUILD": bucket,
                "BACKLOG_MONITOR": bucket
            },
            "top_n": {"risk": 2.0, "value": 2.0, "research": 2.0}
        });
        assert!(crate::validation::validate_decision_policy(&document).ok);

        let features: Vec<Feature> = (0..6)
            .map(|i| feature(json!({"feature_id": format!("risky_{i}"), "fragility_score": 90, "maturity_score": 4})))
            .collect();
        let policy = DecisionPolicy::from_value(&document);
        let report = build_feature_priority_queue(&FeatureHealthSnapshot::new(features), &policy, &GateThresholds::default());
        assert_eq!(report.totals.risk, 6);
        assert_eq!(report.queue.risk.len(), 2);
    }
}
