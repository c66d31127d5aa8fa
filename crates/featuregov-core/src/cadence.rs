//! # Operating Cadence Status
//!
//! Freshness of the daily, weekly and monthly governance jobs.
//!
//! A job is stale when it has never run, or when the time since its newest
//! run exceeds `max_staleness_hours`. The comparison is strict: a job last
//! run exactly at the boundary is still fresh.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::primitives::MS_PER_HOUR;
use crate::timestamp;
use crate::types::{CadenceJobPolicy, CadencePolicy, OperatingRunRecord};

/// One of the three recurring governance jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    pub const ALL: [Cadence; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Staleness window used when the policy does not set one.
    #[must_use]
    pub fn default_staleness_hours(self) -> f64 {
        match self {
            Self::Daily => 24.0,
            Self::Weekly => 168.0,
            Self::Monthly => 840.0,
        }
    }

    fn job_policy(self, policy: &CadencePolicy) -> CadenceJobPolicy {
        let jobs = policy.cadences.clone().unwrap_or_default();
        let job = match self {
            Self::Daily => jobs.daily,
            Self::Weekly => jobs.weekly,
            Self::Monthly => jobs.monthly,
        };
        job.unwrap_or_default()
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Freshness report for one cadence job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceJobStatus {
    pub cadence: Cadence,
    pub enabled: bool,
    pub owner: Option<String>,
    pub run_window_utc: Option<String>,
    pub max_staleness_hours: f64,
    /// RFC 3339 rendering of the newest run, when there is one.
    pub last_run_at: Option<String>,
    pub last_run_at_ms: Option<i64>,
    pub last_status: Option<String>,
    pub stale: bool,
    /// Hours since the newest run; `None` when the job never ran.
    pub stale_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceJobs {
    pub daily: CadenceJobStatus,
    pub weekly: CadenceJobStatus,
    pub monthly: CadenceJobStatus,
}

impl CadenceJobs {
    /// Iterate the three jobs in cadence order.
    pub fn iter(&self) -> impl Iterator<Item = &CadenceJobStatus> {
        [&self.daily, &self.weekly, &self.monthly].into_iter()
    }
}

/// Aggregate freshness of the operating cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCadenceStatus {
    pub stale: bool,
    pub stale_count: usize,
    pub jobs: CadenceJobs,
}

/// Build the cadence status at `now_ms` (epoch milliseconds).
///
/// Only records whose `kind` is the operating-run kind count; records with an
/// unparseable `run_at` are ignored. Disabled jobs are still reported stale
/// when they have not run within their window.
#[must_use]
pub fn build_feature_operating_status(
    policy: &CadencePolicy,
    runs: &[OperatingRunRecord],
    now_ms: i64,
) -> OperatingCadenceStatus {
    let jobs = CadenceJobs {
        daily: job_status(Cadence::Daily, policy, runs, now_ms),
        weekly: job_status(Cadence::Weekly, policy, runs, now_ms),
        monthly: job_status(Cadence::Monthly, policy, runs, now_ms),
    };
    let stale_count = jobs.iter().filter(|job| job.stale).count();
    tracing::debug!(stale_count, now_ms, "operating cadence evaluated");
    OperatingCadenceStatus {
        stale: stale_count > 0,
        stale_count,
        jobs,
    }
}

fn job_status(
    cadence: Cadence,
    policy: &CadencePolicy,
    runs: &[OperatingRunRecord],
    now_ms: i64,
) -> CadenceJobStatus {
    let job = cadence.job_policy(policy);
    let max_staleness_hours = job
        .max_staleness_hours
        .unwrap_or_else(|| cadence.default_staleness_hours());

    let last_run = runs
        .iter()
        .filter(|run| run.is_operating_run() && run.cadence.as_deref() == Some(cadence.as_str()))
        .filter_map(|run| run.run_at_ms().map(|ms| (ms, run)))
        .max_by_key(|(ms, _)| *ms);

    let (stale, stale_hours) = match last_run {
        None => (true, None),
        Some((run_ms, _)) => {
            if run_ms > now_ms {
                tracing::debug!(cadence = %cadence, run_ms, now_ms, "last run is ahead of the clock");
            }
            let elapsed_ms = now_ms.saturating_sub(run_ms).max(0) as f64;
            (
                elapsed_ms > max_staleness_hours * MS_PER_HOUR,
                Some(elapsed_ms / MS_PER_HOUR),
            )
        }
    };

    CadenceJobStatus {
        cadence,
        enabled: job.enabled.unwrap_or(false),
        owner: job.owner,
        run_window_utc: job.run_window_utc,
        max_staleness_hours,
        last_run_at: last_run.and_then(|(ms, _)| timestamp::format_ms(ms)),
        last_run_at_ms: last_run.map(|(ms, _)| ms),
        last_status: last_run.and_then(|(_, run)| run.status.clone()),
        stale,
        stale_hours,
    }
}

// =============================================================================
// TESTS
// =============================================================================
