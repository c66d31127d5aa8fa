//! # Engine Primitives
//!
//! Hardcoded constants for the governance engine.
//!
//! Policies carry the tunable thresholds. The values here are either fixed
//! rules of the decision list or the baselines used when a policy or a
//! feature record omits a field.

// =============================================================================
// CHANGE RESOLVER
// =============================================================================

/// Maximum number of distinct changed paths considered by the resolver.
///
/// Paths beyond this cap (after normalization and deduplication) are ignored.
pub const MAX_CHANGED_PATHS: usize = 256;

/// Repository path of the feature registry itself.
///
/// A change to this file can affect any feature, so the resolver treats it as
/// touching every registered feature.
pub const DEFAULT_REGISTRY_PATH: &str = "sidecars/ted-engine/config/feature_registry.json";

// =============================================================================
// RELEASE GATE DEFAULTS
// =============================================================================

/// Fragility score at or above which a feature is considered frozen.
pub const DEFAULT_FREEZE_FRAGILITY_SCORE: f64 = 70.0;

/// Fragility score at or above which an advisory escalation is raised.
pub const DEFAULT_ESCALATION_FRAGILITY_SCORE: f64 = 50.0;

/// Adoption ratio at or below which a feature counts as low usage.
pub const DEFAULT_LOW_USAGE_ADOPTION_RATIO: f64 = 0.1;

// =============================================================================
// PRIORITY QUEUE
// =============================================================================

/// Default weight of the fragility component of the priority score.
pub const DEFAULT_WEIGHT_FRAGILITY: f64 = 0.4;

/// Default weight of the maturity-gap component of the priority score.
pub const DEFAULT_WEIGHT_MATURITY_GAP: f64 = 0.3;

/// Default weight of the value-opportunity component of the priority score.
pub const DEFAULT_WEIGHT_VALUE_OPPORTUNITY: f64 = 0.3;

/// Allowed deviation of the decision weights from a sum of exactly 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-4;

/// Score at or above which an otherwise unbucketed feature needs remediation.
pub const RISK_SCORE_FLOOR: f64 = 75.0;

/// Default length of each truncated bucket.
pub const DEFAULT_TOP_N: usize = 10;

/// Smallest `top_n` a decision policy may configure.
pub const TOP_N_MIN: i64 = 1;

/// Largest `top_n` a decision policy may configure.
pub const TOP_N_MAX: i64 = 50;

/// Upper bound of the fragility scale.
pub const MAX_FRAGILITY_SCORE: f64 = 100.0;

/// Upper bound of the maturity scale.
pub const MAX_MATURITY_SCORE: f64 = 5.0;

// =============================================================================
// OPERATING CADENCE
// =============================================================================

/// Ledger `kind` marking an operating run record.
pub const OPERATING_RUN_KIND: &str = "feature_operating_run";

/// Upper bound for `max_staleness_hours` (one leap year).
pub const MAX_STALENESS_HOURS_LIMIT: i64 = 8784;

/// Milliseconds in one hour.
pub const MS_PER_HOUR: f64 = 3_600_000.0;
