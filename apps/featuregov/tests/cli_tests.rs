//! Integration tests for the featuregov command layer.
//!
//! Each test lays out a throwaway workspace with policy files and ledgers,
//! then drives the commands through the library API.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use featuregov::cli::{
    GateOptions, build_queue, cmd_cadence, cmd_gate, cmd_queue, cmd_resolve, cmd_validate,
    cmd_validate_all, evaluate_gate, operating_status, read_research_triggers, read_snapshot,
    resolve_changes,
};
use featuregov::config::GovernanceConfig;
use featuregov_core::{FindingCode, PolicyKind};
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// FIXTURES
// =============================================================================

/// Epoch milliseconds of 2026-03-01T21:20:00Z, 15h20m after the daily run.
const FIXED_NOW_MS: i64 = 1_772_400_000_000;

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn gate_policy() -> Value {
    json!({
        "_artifact": "feature_release_gate_policy",
        "_config_version": 1,
        "mode": "hard",
        "hard_fail_rules": {
            "block_frozen_feature_changes": true,
            "block_missing_qa_security_mapping": true,
            "block_open_research_triggers": true
        },
        "advisory_rules": {"warn_connector_certification_gap": true},
        "thresholds": {
            "freeze_fragility_score": 70,
            "escalation_fragility_score": 50,
            "low_usage_adoption_ratio": 0.1
        },
        "override": {"enabled": true, "allowed_roles": ["release_manager"]},
        "required_reason_codes": ["HOTFIX"]
    })
}

fn decision_policy() -> Value {
    let bucket = json!({"min_score": 0, "conditions": ["see decision list"]});
    json!({
        "_artifact": "feature_decision_policy",
        "_config_version": 1,
        "weights": {"fragility": 0.4, "maturity_gap": 0.3, "value_opportunity": 0.3},
        "buckets": {
            "RISK_REMEDIATION_NOW": bucket,
            "VALUE_ACTIVATION_NOW": bucket,
            "RESEARCH_BEFORE_BUILD": bucket,
            "BACKLOG_MONITOR": bucket
        },
        "top_n": {"risk": 5, "value": 5, "research": 5}
    })
}

fn cadence_policy() -> Value {
    let job = |hours: u32| {
        json!({
            "enabled": true,
            "owner": "governance",
            "run_window_utc": "06:00-07:00",
            "max_staleness_hours": hours,
            "actions": ["refresh"]
        })
    };
    json!({
        "_artifact": "feature_operating_cadence",
        "_config_version": 1,
        "timezone": "UTC",
        "cadences": {"daily": job(24), "weekly": job(168), "monthly": job(840)},
        "escalation": {"notify_roles": ["operator"]}
    })
}

/// Workspace with policies, a registry and both ledgers.
fn workspace() -> (TempDir, GovernanceConfig) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("policies")).unwrap();

    write_json(&root.join("policies/feature_release_gate_policy.json"), &gate_policy());
    write_json(&root.join("policies/feature_decision_policy.json"), &decision_policy());
    write_json(&root.join("policies/feature_operating_cadence.json"), &cadence_policy());
    write_json(
        &root.join("registry.json"),
        &json!({"features": [{"feature_id": "connector_alpha"}, {"feature_id": "builder_lane"}]}),
    );

    let snapshot = json!({
        "generated_at": "2026-03-01T00:00:00Z",
        "features": [
            {
                "feature_id": "connector_alpha",
                "plane": "connector",
                "fragility_score": 90,
                "maturity_score": 3,
                "usage_signals": {"adoption_ratio_30d": 0.5},
                "qa_contracts": {"test_suites": ["s"]},
                "security_controls": {"policy_refs": ["p"], "owasp_llm_top10": ["LLM01"]}
            },
            {
                "feature_id": "builder_lane",
                "plane": "experience",
                "fragility_score": 20,
                "maturity_score": 4,
                "usage_signals": {"adoption_ratio_30d": 0.1},
                "qa_contracts": {"test_suites": ["s"]},
                "security_controls": {"policy_refs": ["p"], "owasp_llm_top10": ["LLM02"]}
            }
        ]
    });
    let ledger = format!("{{\"generated_at\": \"2026-02-01T00:00:00Z\", \"features\": []}}\n{}\n", snapshot);
    std::fs::write(root.join("health.jsonl"), ledger).unwrap();
    std::fs::write(
        root.join("runs.jsonl"),
        "{\"kind\": \"feature_operating_run\", \"cadence\": \"daily\", \"run_at\": \"2026-03-01T06:00:00Z\", \"status\": \"ok\"}\n",
    )
    .unwrap();

    let config = GovernanceConfig::from_toml_str(&format!(
        r#"
        [policies]
        dir = "{root}/policies"

        [ledgers]
        feature_health = "{root}/health.jsonl"
        operating_runs = "{root}/runs.jsonl"
        research_triggers = "{root}/triggers.jsonl"

        [registry]
        file = "{root}/registry.json"
        "#,
        root = root.display()
    ))
    .unwrap();
    (dir, config)
}

// =============================================================================
// VALIDATE
// =============================================================================

#[test]
fn validate_reports_success_and_failure() {
    let (dir, _) = workspace();
    let good = dir.path().join("policies/feature_release_gate_policy.json");
    assert!(cmd_validate(&[good.clone()], None, true).unwrap());

    let bad = dir.path().join("bad.json");
    let mut doc = gate_policy();
    doc["mode"] = json!("strict");
    write_json(&bad, &doc);
    assert!(!cmd_validate(&[good, bad], None, true).unwrap());
}

#[test]
fn validate_with_kind_checks_artifact() {
    let (dir, _) = workspace();
    let decision = dir.path().join("policies/feature_decision_policy.json");
    assert!(!cmd_validate(&[decision], Some(PolicyKind::ReleaseGate), false).unwrap());
}

#[test]
fn validate_missing_file_fails_without_error() {
    let (dir, _) = workspace();
    let missing = dir.path().join("nope.json");
    assert!(!cmd_validate(&[missing], None, false).unwrap());
}

#[test]
fn validate_all_fails_when_documents_are_missing() {
    let (_dir, config) = workspace();
    assert!(!cmd_validate_all(&config, true).unwrap());
}

// =============================================================================
// RESOLVE & GATE
// =============================================================================

#[test]
fn resolve_reads_registry() {
    let (_dir, config) = workspace();
    let ids = resolve_changes(&config, &["modules/builder_lane.mjs".to_string()]).unwrap();
    assert_eq!(ids, vec!["builder_lane".to_string()]);
    cmd_resolve(&config, &["modules/builder_lane.mjs".to_string()], true).unwrap();
}

#[test]
fn registry_edit_touches_every_feature() {
    let (_dir, config) = workspace();
    let ids = resolve_changes(
        &config,
        &["sidecars/ted-engine/config/feature_registry.json".to_string()],
    )
    .unwrap();
    assert_eq!(ids, vec!["builder_lane".to_string(), "connector_alpha".to_string()]);
}

#[test]
fn gate_blocks_frozen_connector() {
    let (_dir, config) = workspace();
    let options = GateOptions {
        changed_paths: vec!["sidecars/connectors/connector_alpha/client.mjs".to_string()],
        ..GateOptions::default()
    };
    let result = evaluate_gate(&config, &options).unwrap();
    assert_eq!(result.changed_feature_ids, vec!["connector_alpha".to_string()]);
    assert!(result.would_block);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].code, FindingCode::FrozenFeatureChangeBlocked);
    assert!(!cmd_gate(&config, &options, true).unwrap());
}

#[test]
fn gate_override_unblocks() {
    let (_dir, config) = workspace();
    let options = GateOptions {
        feature_ids: vec!["connector_alpha".to_string()],
        reason_code: Some("HOTFIX".to_string()),
        ticket_ref: Some("OPS-123".to_string()),
        ..GateOptions::default()
    };
    let result = evaluate_gate(&config, &options).unwrap();
    assert!(result.would_block);
    assert!(result.override_outcome.accepted);
    assert_eq!(result.override_outcome.ticket_ref.as_deref(), Some("OPS-123"));
    assert!(cmd_gate(&config, &options, false).unwrap());
}

#[test]
fn gate_blocks_on_open_research_trigger() {
    let (dir, config) = workspace();
    std::fs::write(
        dir.path().join("triggers.jsonl"),
        "{\"feature_id\": \"builder_lane\", \"triggered_at\": \"2026-03-02T00:00:00Z\"}\n",
    )
    .unwrap();
    let options = GateOptions {
        feature_ids: vec!["builder_lane".to_string()],
        ..GateOptions::default()
    };
    let result = evaluate_gate(&config, &options).unwrap();
    let codes: Vec<FindingCode> = result.violations.iter().map(|v| v.code).collect();
    assert_eq!(codes, vec![FindingCode::OpenResearchTriggerBlocked]);
    assert!(!cmd_gate(&config, &options, true).unwrap());
}

#[test]
fn research_triggers_accept_json_array() {
    let (dir, _) = workspace();
    let path = dir.path().join("triggers.json");
    write_json(&path, &json!([{"feature_id": "a", "triggered_at": "2026-03-02"}, "junk"]));
    let triggers = read_research_triggers(&path).unwrap();
    assert_eq!(triggers.len(), 2);
    assert!(triggers[0].is_open_for("a"));
    assert!(triggers[1].feature_id.is_none());
}

#[test]
fn missing_trigger_file_is_empty() {
    let (dir, _) = workspace();
    assert!(read_research_triggers(&dir.path().join("absent.jsonl")).unwrap().is_empty());
}

// =============================================================================
// QUEUE & CADENCE
// =============================================================================

#[test]
fn snapshot_comes_from_newest_non_empty_entry() {
    let (_dir, config) = workspace();
    let snapshot = read_snapshot(&config.ledgers.feature_health).unwrap();
    assert_eq!(snapshot.features.len(), 2);
    assert_eq!(snapshot.generated_at.as_deref(), Some("2026-03-01T00:00:00Z"));
}

#[test]
fn queue_runs_end_to_end() {
    let (_dir, config) = workspace();
    let report = build_queue(&config).unwrap();
    assert_eq!(report.totals.features, 2);

    let risk: Vec<&str> = report.queue.risk.iter().map(|e| e.feature_id.as_str()).collect();
    assert_eq!(risk, vec!["connector_alpha"]);
    let value: Vec<&str> = report.queue.value.iter().map(|e| e.feature_id.as_str()).collect();
    assert_eq!(value, vec!["builder_lane"]);
    assert!(report.queue.research.is_empty());
    assert!(report.queue.backlog.is_empty());

    cmd_queue(&config, true).unwrap();
}

#[test]
fn queue_without_decision_policy_is_an_error() {
    let (dir, config) = workspace();
    std::fs::remove_file(dir.path().join("policies/feature_decision_policy.json")).unwrap();
    assert!(cmd_queue(&config, true).is_err());
}

#[test]
fn cadence_runs_at_fixed_instant() {
    let (_dir, config) = workspace();
    let status = operating_status(&config, Some(FIXED_NOW_MS)).unwrap();

    assert!(!status.jobs.daily.stale);
    assert_eq!(status.jobs.daily.last_status.as_deref(), Some("ok"));
    assert!(status.jobs.daily.stale_hours.is_some_and(|h| (h - 15.333).abs() < 0.01));
    assert!(status.jobs.weekly.stale);
    assert!(status.jobs.monthly.stale);
    assert_eq!(status.stale_count, 2);
    assert!(status.stale);

    cmd_cadence(&config, Some(FIXED_NOW_MS), false).unwrap();
}

#[test]
fn cadence_without_run_ledger_marks_every_job_stale() {
    let (dir, config) = workspace();
    std::fs::remove_file(dir.path().join("runs.jsonl")).unwrap();
    let status = operating_status(&config, Some(FIXED_NOW_MS)).unwrap();
    assert_eq!(status.stale_count, 3);
}

// =============================================================================
// CONFIG FILE
// =============================================================================

#[test]
fn explicit_config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("featuregov.toml");
    std::fs::write(&path, "[registry]\nrepo_path = \"config/features.json\"\n").unwrap();
    let config = GovernanceConfig::from_file(&path).unwrap();
    assert_eq!(config.registry.repo_path, "config/features.json");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(GovernanceConfig::from_file(&dir.path().join("absent.toml")).is_err());
}
