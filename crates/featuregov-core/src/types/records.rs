//! Research triggers, operator overrides and operating-run records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;
use crate::primitives::OPERATING_RUN_KIND;
use crate::timestamp;

/// An open flag meaning "this feature needs investigation before further change".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchTriggerRecord {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub feature_id: Option<String>,
    #[serde(default)]
    pub triggered_at: Option<Value>,
}

impl ResearchTriggerRecord {
    #[must_use]
    pub fn new(feature_id: impl Into<String>, triggered_at: impl Into<String>) -> Self {
        Self {
            feature_id: Some(feature_id.into()),
            triggered_at: Some(Value::String(triggered_at.into())),
        }
    }

    /// Read a record from an arbitrary JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        lenient::from_value_or_default(value)
    }

    /// Epoch milliseconds of `triggered_at`, if it parses.
    #[must_use]
    pub fn triggered_at_ms(&self) -> Option<i64> {
        self.triggered_at.as_ref().and_then(timestamp::value_to_ms)
    }

    /// Whether this record is an open trigger for the given feature.
    #[must_use]
    pub fn is_open_for(&self, feature_id: &str) -> bool {
        self.feature_id.as_deref() == Some(feature_id) && self.triggered_at_ms().is_some()
    }
}

/// Operator-supplied request to unblock a hard-mode block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseGateOverride {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub reason_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub ticket_ref: Option<String>,
}

impl ReleaseGateOverride {
    #[must_use]
    pub fn new(reason_code: impl Into<String>, ticket_ref: impl Into<String>) -> Self {
        Self {
            reason_code: Some(reason_code.into()),
            ticket_ref: Some(ticket_ref.into()),
        }
    }
}

/// One entry of the operating-run ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingRunRecord {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub cadence: Option<String>,
    #[serde(default)]
    pub run_at: Option<Value>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub status: Option<String>,
}

impl OperatingRunRecord {
    /// Build an operating-run record for the given cadence name.
    #[must_use]
    pub fn new(cadence: impl Into<String>, run_at: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            kind: Some(OPERATING_RUN_KIND.to_string()),
            cadence: Some(cadence.into()),
            run_at: Some(Value::String(run_at.into())),
            status: Some(status.into()),
        }
    }

    /// Read a record from an arbitrary JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        lenient::from_value_or_default(value)
    }

    #[must_use]
    pub fn is_operating_run(&self) -> bool {
        self.kind.as_deref() == Some(OPERATING_RUN_KIND)
    }

    /// Epoch milliseconds of `run_at`, if it parses.
    #[must_use]
    pub fn run_at_ms(&self) -> Option<i64> {
        self.run_at.as_ref().and_then(timestamp::value_to_ms)
    }
}
