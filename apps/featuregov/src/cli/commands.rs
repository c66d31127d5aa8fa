//! # CLI Command Implementations
//!
//! Each command loads its inputs from disk, calls the engine once and prints
//! the result. Commands return `Ok(false)` when the outcome should fail the
//! process (a policy did not validate, a hard gate blocked).

use crate::config::GovernanceConfig;
use featuregov_core::{
    CadencePolicy, ChangeResolver, DecisionPolicy, FeatureHealthSnapshot, FeaturePriorityReport,
    FeatureRegistry, GovernanceError, OperatingCadenceStatus, OperatingRunRecord, PolicyKind,
    ReleaseGateOverride, ReleaseGatePolicy, ReleaseGateResult, ResearchTriggerRecord,
    ValidationReport, build_feature_operating_status, build_feature_priority_queue,
    evaluate_feature_release_gate, parse_ledger, validate_document,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a single policy document or registry (10 MB).
const MAX_DOCUMENT_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum size of a ledger file (500 MB).
///
/// Ledgers are append-only and grow without bound, so they get more room.
const MAX_LEDGER_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), GovernanceError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GovernanceError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(GovernanceError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize a path and require it to be a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, GovernanceError> {
    let canonical = path.canonicalize().map_err(|e| {
        GovernanceError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(GovernanceError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

fn read_text(path: &Path, max_size: u64) -> Result<String, GovernanceError> {
    let canonical = validate_file_path(path)?;
    validate_file_size(&canonical, max_size)?;
    std::fs::read_to_string(&canonical)
        .map_err(|e| GovernanceError::Io(format!("Cannot read '{}': {}", path.display(), e)))
}

/// Read a JSON document.
pub fn read_json(path: &Path) -> Result<Value, GovernanceError> {
    let text = read_text(path, MAX_DOCUMENT_FILE_SIZE)?;
    serde_json::from_str(&text)
        .map_err(|e| GovernanceError::Parse(format!("'{}': {}", path.display(), e)))
}

/// Read the newest usable snapshot of the feature-health ledger.
///
/// A ledger with no usable entry yields an empty snapshot.
pub fn read_snapshot(path: &Path) -> Result<FeatureHealthSnapshot, GovernanceError> {
    let text = read_text(path, MAX_LEDGER_FILE_SIZE)?;
    Ok(FeatureHealthSnapshot::latest_from_ledger(&text).unwrap_or_else(|| {
        tracing::warn!(path = %path.display(), "feature-health ledger has no entry with features");
        FeatureHealthSnapshot::default()
    }))
}

/// Read research triggers from a JSON array or a line-delimited ledger.
///
/// A missing file means there are no open triggers.
pub fn read_research_triggers(path: &Path) -> Result<Vec<ResearchTriggerRecord>, GovernanceError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no research trigger file");
        return Ok(Vec::new());
    }
    let text = read_text(path, MAX_LEDGER_FILE_SIZE)?;
    let entries = if text.trim_start().starts_with('[') {
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items,
            Ok(_) => Vec::new(),
            Err(e) => {
                return Err(GovernanceError::Parse(format!("'{}': {}", path.display(), e)));
            }
        }
    } else {
        parse_ledger(&text)
    };
    Ok(entries.iter().map(ResearchTriggerRecord::from_value).collect())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), GovernanceError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| GovernanceError::Parse(format!("Cannot encode output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// VALIDATE COMMANDS
// =============================================================================

#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    kind: Option<PolicyKind>,
    /// Set when the file could not be read or decoded at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    load_error: Option<String>,
    #[serde(flatten)]
    report: ValidationReport,
}

fn validate_file(path: &Path, kind: Option<PolicyKind>) -> FileReport {
    let (report, load_error) = match read_json(path) {
        Ok(document) => {
            let report = match kind {
                Some(kind) => kind.validate(&document),
                None => validate_document(&document),
            };
            (report, None)
        }
        Err(e) => (ValidationReport::from_issues(Vec::new()), Some(e.to_string())),
    };
    let ok = report.ok && load_error.is_none();
    if !ok {
        tracing::warn!(path = %path.display(), errors = report.errors.len(), "policy failed validation");
    }
    FileReport {
        path: path.display().to_string(),
        kind,
        load_error,
        report: ValidationReport { ok, ..report },
    }
}

fn print_file_reports(reports: &[FileReport], json_mode: bool) -> Result<bool, GovernanceError> {
    let all_ok = reports.iter().all(|r| r.report.ok);
    if json_mode {
        print_json(&serde_json::json!({ "ok": all_ok, "files": reports }))?;
        return Ok(all_ok);
    }

    for file in reports {
        let label = file.kind.map(|k| k.to_string()).unwrap_or_else(|| "auto".to_string());
        if file.report.ok {
            println!("OK    {} ({})", file.path, label);
        } else {
            println!("FAIL  {} ({})", file.path, label);
            if let Some(error) = &file.load_error {
                println!("      {}", error);
            }
            for issue in &file.report.errors {
                println!("      {} {}: {}", issue.code, issue.path, issue.message);
            }
        }
    }
    Ok(all_ok)
}

/// Validate explicit policy files, by `--kind` or by their own `_artifact`.
pub fn cmd_validate(
    files: &[PathBuf],
    kind: Option<PolicyKind>,
    json_mode: bool,
) -> Result<bool, GovernanceError> {
    let reports: Vec<FileReport> = files.iter().map(|path| validate_file(path, kind)).collect();
    print_file_reports(&reports, json_mode)
}

/// Validate the configured document of every policy kind.
pub fn cmd_validate_all(config: &GovernanceConfig, json_mode: bool) -> Result<bool, GovernanceError> {
    let reports: Vec<FileReport> = PolicyKind::ALL
        .into_iter()
        .map(|kind| validate_file(&config.policy_path(kind), Some(kind)))
        .collect();
    print_file_reports(&reports, json_mode)
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

fn load_registry(config: &GovernanceConfig) -> Result<FeatureRegistry, GovernanceError> {
    Ok(FeatureRegistry::from_value(&read_json(&config.registry.file)?))
}

fn resolver(config: &GovernanceConfig) -> ChangeResolver {
    ChangeResolver::with_registry_path(&config.registry.repo_path)
}

/// Feature ids touched by the given changed paths.
pub fn resolve_changes(config: &GovernanceConfig, paths: &[String]) -> Result<Vec<String>, GovernanceError> {
    let registry = load_registry(config)?;
    Ok(resolver(config).resolve(paths, &registry))
}

/// Print the feature ids touched by the given changed paths.
pub fn cmd_resolve(
    config: &GovernanceConfig,
    paths: &[String],
    json_mode: bool,
) -> Result<(), GovernanceError> {
    let ids = resolve_changes(config, paths)?;

    if json_mode {
        return print_json(&serde_json::json!({ "changed_feature_ids": ids }));
    }
    for id in &ids {
        println!("{}", id);
    }
    Ok(())
}

// =============================================================================
// GATE COMMAND
// =============================================================================

/// Options of the `gate` command.
#[derive(Debug, Default)]
pub struct GateOptions {
    pub changed_paths: Vec<String>,
    /// Feature ids to evaluate directly, bypassing path resolution.
    pub feature_ids: Vec<String>,
    pub reason_code: Option<String>,
    pub ticket_ref: Option<String>,
}

/// Evaluate the release gate for the configured policy and ledgers.
pub fn evaluate_gate(config: &GovernanceConfig, options: &GateOptions) -> Result<ReleaseGateResult, GovernanceError> {
    let policy = ReleaseGatePolicy::from_value(&read_json(&config.policy_path(PolicyKind::ReleaseGate))?);
    let snapshot = read_snapshot(&config.ledgers.feature_health)?;
    let triggers = read_research_triggers(&config.ledgers.research_triggers)?;

    let mut changed = options.feature_ids.clone();
    if !options.changed_paths.is_empty() {
        let registry = load_registry(config)?;
        changed.extend(resolver(config).resolve(&options.changed_paths, &registry));
    }

    let override_request = match (&options.reason_code, &options.ticket_ref) {
        (None, None) => None,
        (reason_code, ticket_ref) => Some(ReleaseGateOverride {
            reason_code: reason_code.clone(),
            ticket_ref: ticket_ref.clone(),
        }),
    };

    Ok(evaluate_feature_release_gate(
        &policy,
        &snapshot,
        &changed,
        &triggers,
        override_request.as_ref(),
    ))
}

/// Evaluate the release gate. Returns the gate's `pass`.
pub fn cmd_gate(
    config: &GovernanceConfig,
    options: &GateOptions,
    json_mode: bool,
) -> Result<bool, GovernanceError> {
    let result = evaluate_gate(config, options)?;
    if result.is_blocked() {
        tracing::warn!(violations = result.violations.len(), "release gate blocked");
    }

    if json_mode {
        print_json(&result)?;
    } else {
        print_gate(&result);
    }
    Ok(result.pass)
}

fn print_gate(result: &ReleaseGateResult) {
    println!("Release Gate");
    println!("============");
    println!("Mode:        {}", result.mode);
    println!("Pass:        {}", result.pass);
    println!("Would block: {}", result.would_block);
    println!("Features:    {}", result.changed_feature_ids.join(", "));
    if !result.violations.is_empty() {
        println!();
        println!("Violations:");
        for finding in &result.violations {
            println!("  {} [{}] {}", finding.code, finding.feature_id, finding.message);
        }
    }
    if !result.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for finding in &result.warnings {
            println!("  {} [{}] {}", finding.code, finding.feature_id, finding.message);
        }
    }
    let outcome = &result.override_outcome;
    if outcome.requested {
        println!();
        match (&outcome.reason_code, &outcome.ticket_ref) {
            (Some(reason), Some(ticket)) if outcome.accepted => {
                println!("Override accepted: {} ({})", reason, ticket);
            }
            _ => println!("Override rejected"),
        }
    }
}

// =============================================================================
// QUEUE COMMAND
// =============================================================================

/// Build the priority queue from the configured policies and ledger.
pub fn build_queue(config: &GovernanceConfig) -> Result<FeaturePriorityReport, GovernanceError> {
    let decision = DecisionPolicy::from_value(&read_json(&config.policy_path(PolicyKind::Decision))?);
    let gate = ReleaseGatePolicy::from_value(&read_json(&config.policy_path(PolicyKind::ReleaseGate))?);
    let snapshot = read_snapshot(&config.ledgers.feature_health)?;
    Ok(build_feature_priority_queue(&snapshot, &decision, &gate.thresholds()))
}

/// Build and print the priority queue.
pub fn cmd_queue(config: &GovernanceConfig, json_mode: bool) -> Result<(), GovernanceError> {
    let report = build_queue(config)?;
    if json_mode {
        return print_json(&report);
    }
    print_queue(&report);
    Ok(())
}

fn print_queue(report: &FeaturePriorityReport) {
    let totals = &report.totals;
    println!("Feature Priority Queue");
    println!("======================");
    println!(
        "Features: {} (risk {}, value {}, research {}, backlog {})",
        totals.features, totals.risk, totals.value, totals.research, totals.backlog
    );
    let sections = [
        ("Risk remediation", &report.queue.risk),
        ("Value activation", &report.queue.value),
        ("Research before build", &report.queue.research),
        ("Backlog", &report.queue.backlog),
    ];
    for (title, entries) in sections {
        println!();
        println!("{}:", title);
        if entries.is_empty() {
            println!("  (none)");
        }
        for entry in entries {
            println!(
                "  {:>6.2}  {:<32} {}",
                entry.score, entry.feature_id, entry.recommended_action
            );
        }
    }
}

// =============================================================================
// CADENCE COMMAND
// =============================================================================

/// Operating cadence freshness at `now_ms` (defaults to the clock).
pub fn operating_status(
    config: &GovernanceConfig,
    now_ms: Option<i64>,
) -> Result<OperatingCadenceStatus, GovernanceError> {
    let policy = CadencePolicy::from_value(&read_json(&config.policy_path(PolicyKind::OperatingCadence))?);
    let ledger = &config.ledgers.operating_runs;
    let runs = if ledger.exists() {
        OperatingRunRecord::from_ledger(&read_text(ledger, MAX_LEDGER_FILE_SIZE)?)
    } else {
        tracing::warn!(path = %ledger.display(), "operating-run ledger not found");
        Vec::new()
    };
    let now_ms = now_ms.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

    Ok(build_feature_operating_status(&policy, &runs, now_ms))
}

/// Report operating cadence freshness at `now_ms` (defaults to the clock).
pub fn cmd_cadence(
    config: &GovernanceConfig,
    now_ms: Option<i64>,
    json_mode: bool,
) -> Result<(), GovernanceError> {
    let status = operating_status(config, now_ms)?;
    if status.stale {
        tracing::warn!(stale_count = status.stale_count, "operating cadence is stale");
    }
    if json_mode {
        return print_json(&status);
    }
    print_cadence(&status);
    Ok(())
}

fn print_cadence(status: &OperatingCadenceStatus) {
    println!("Operating Cadence");
    println!("=================");
    println!("Stale jobs: {}", status.stale_count);
    println!();
    for job in status.jobs.iter() {
        let last = job.last_run_at.as_deref().unwrap_or("never");
        let state = if job.stale { "STALE" } else { "fresh" };
        println!(
            "  {:<8} {:<6} last run {} (window {}h, owner {})",
            job.cadence.as_str(),
            state,
            last,
            job.max_staleness_hours,
            job.owner.as_deref().unwrap_or("-")
        );
    }
}
