//! # Ledger Format
//!
//! Append-only, one JSON object per line. Older lines are history; readers
//! select the entries they need from the tail.
//!
//! Malformed lines are skipped with a warning rather than failing the whole
//! ledger, so a single truncated append cannot hide the rest of the history.

use serde_json::Value;

use crate::GovernanceError;
use crate::types::{FeatureHealthSnapshot, OperatingRunRecord};

/// Longest ledger line accepted before decoding is attempted.
pub const MAX_LEDGER_LINE_BYTES: usize = 16 * 1024 * 1024;

/// Decode one ledger line into a JSON object.
pub fn decode_ledger_line(line: &str) -> Result<Value, GovernanceError> {
    if line.len() > MAX_LEDGER_LINE_BYTES {
        return Err(GovernanceError::Parse(format!(
            "ledger line of {} bytes exceeds maximum allowed {} bytes",
            line.len(),
            MAX_LEDGER_LINE_BYTES
        )));
    }
    let value: Value = serde_json::from_str(line)
        .map_err(|e| GovernanceError::Parse(format!("invalid ledger line: {e}")))?;
    if !value.is_object() {
        return Err(GovernanceError::Parse(
            "ledger line is not a JSON object".to_string(),
        ));
    }
    Ok(value)
}

/// Decode every well-formed line of a ledger, in file order.
///
/// Blank lines are ignored; malformed lines are logged and skipped.
#[must_use]
pub fn parse_ledger(text: &str) -> Vec<Value> {
    let mut entries = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match decode_ledger_line(line) {
            Ok(value) => entries.push(value),
            Err(e) => tracing::warn!(line = index + 1, error = %e, "skipping malformed ledger line"),
        }
    }
    entries
}

impl FeatureHealthSnapshot {
    /// Newest ledger entry that carries a non-empty `features` list.
    #[must_use]
    pub fn latest_from_entries(entries: &[Value]) -> Option<Self> {
        entries
            .iter()
            .rev()
            .map(Self::from_value)
            .find(|snapshot| !snapshot.features.is_empty())
    }

    /// Parse a feature-health ledger and select its newest usable snapshot.
    #[must_use]
    pub fn latest_from_ledger(text: &str) -> Option<Self> {
        Self::latest_from_entries(&parse_ledger(text))
    }
}

impl OperatingRunRecord {
    /// Every entry of an operating-run ledger, in file order.
    ///
    /// Entries of other kinds are kept; the cadence builder filters them.
    #[must_use]
    pub fn from_ledger(text: &str) -> Vec<Self> {
        parse_ledger(text).iter().map(Self::from_value).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_non_objects() {
        assert!(decode_ledger_line("[1, 2]").is_err());
        assert!(decode_ledger_line("{\"ok\": true").is_err());
        assert!(decode_ledger_line("{\"ok\": true}").is_ok());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let text = "{\"a\": 1}\n\nnot json\n  {\"b\": 2}  \n";
        let entries = parse_ledger(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["b"], 2);
    }

    #[test]
    fn latest_snapshot_skips_empty_tail_entries() {
        let text = concat!(
            "{\"generated_at\": \"2026-03-01T00:00:00Z\", \"features\": [{\"feature_id\": \"old\"}]}\n",
            "{\"generated_at\": \"2026-03-02T00:00:00Z\", \"features\": [{\"feature_id\": \"new\"}]}\n",
            "{\"generated_at\": \"2026-03-03T00:00:00Z\", \"features\": []}\n",
            "{\"generated_at\": \"2026-03-04T00:00:00Z\", \"note\": \"heartbeat\"}\n",
        );
        let snapshot = FeatureHealthSnapshot::latest_from_ledger(text).expect("snapshot");
        assert_eq!(snapshot.generated_at.as_deref(), Some("2026-03-02T00:00:00Z"));
        assert!(snapshot.find("new").is_some());
    }

    #[test]
    fn empty_ledger_has_no_snapshot() {
        assert!(FeatureHealthSnapshot::latest_from_ledger("").is_none());
    }

    #[test]
    fn run_ledger_reads_every_entry() {
        let text = concat!(
            "{\"kind\": \"feature_operating_run\", \"cadence\": \"daily\", \"run_at\": \"2026-03-01T06:10:00Z\", \"status\": \"ok\"}\n",
            "{\"kind\": \"feature_health_snapshot\"}\n",
        );
        let runs = OperatingRunRecord::from_ledger(text);
        assert_eq!(runs.len(), 2);
        assert!(runs[0].is_operating_run());
        assert!(!runs[1].is_operating_run());
    }
}
