//! Validators for runtime-behavior policies: transport, context, knowledge
//! retrieval, discovery/ingestion quality and MCP trust.

use serde_json::Value;

use super::checker::{Checker, Scope};
use super::{IssueCode, PolicyKind, ValidationReport};

const TIER_CONTROL_FLAGS: [&str; 3] = [
    "allow_write_tools",
    "require_operator_approval",
    "egress_logging_required",
];

/// `governance.{emit_events, reason_codes}` shared by several documents.
fn check_governance_block(c: &mut Checker, root: &Scope<'_>) {
    if let Some(governance) = c.object(root, "governance") {
        c.string_list(&governance, "emit_events");
        c.string_list(&governance, "reason_codes");
    }
}

/// Validate a `transport_policy` document.
#[must_use]
pub fn validate_transport_policy(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::Transport);

    let modes = c.string_list(&root, "allowed_modes");
    c.one_of(&root, "default_mode", &modes);
    for (_, provider) in c.optional_entries(&root, "provider_overrides") {
        c.one_of(&provider, "mode", &modes);
        c.one_of(&provider, "fallback_mode", &modes);
        c.integer_min(&provider, "max_parallel_sockets", 1);
        c.boolean(&provider, "retry_on_transient_failure");
    }

    c.finish()
}

/// Validate a `context_policy` document.
#[must_use]
pub fn validate_context_policy(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::Context);

    if let Some(compaction) = c.object(&root, "compaction") {
        c.integer_min(&compaction, "compact_threshold_tokens", 2000);
        c.integer_min(&compaction, "post_compaction_target_tokens", 1000);
        c.string_list(&compaction, "preserve_sections");
    }
    if let Some(prompt_cache) = c.object(&root, "prompt_cache") {
        c.integer_min(&prompt_cache, "max_prefix_segments", 1);
    }

    c.finish()
}

/// Validate a `knowledge_retrieval_policy` document.
#[must_use]
pub fn validate_knowledge_retrieval_policy(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::KnowledgeRetrieval);

    let modes = c.string_list(&root, "allowed_modes");
    c.one_of(&root, "default_mode", &modes);

    for (mode, index) in c.entries(&root, "indexes") {
        if !modes.is_empty() && !modes.contains(&mode) {
            c.push(
                IssueCode::ValueNotAllowed,
                format!("indexes.{mode}"),
                format!("index \"{mode}\" is not one of allowed_modes"),
            );
        }
        c.boolean(&index, "enabled");
        c.string_list(&index, "allowed_ledgers");
        c.integer_min(&index, "max_candidates", 1);
    }

    if let Some(query) = c.object(&root, "query_constraints") {
        c.integer_min(&query, "max_query_length", 32);
        c.integer_min(&query, "max_top_k", 1);
        c.integer_min(&query, "max_context_tokens", 256);
        c.number(&query, "min_similarity", 0.0, 1.0);
        c.integer_min(&query, "min_citation_count", 1);
    }

    if let Some(security) = c.object(&root, "security") {
        c.boolean(&security, "redact_secrets");
        c.boolean(&security, "enforce_ledger_allowlist");
        c.string_list(&security, "blocked_pattern_refs");
    }

    if let Some(fallback) = c.object(&root, "fallback") {
        c.string(&fallback, "on_empty_result");
        c.string(&fallback, "on_policy_violation");
        c.boolean(&fallback, "emit_governance_event");
    }

    check_governance_block(&mut c, &root);
    c.finish()
}

/// Validate a `discovery_ingestion_quality_policy` document.
#[must_use]
pub fn validate_discovery_ingestion_quality_policy(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::DiscoveryIngestionQuality);

    if let Some(discovery) = c.object(&root, "discovery") {
        c.boolean(&discovery, "incremental_cursor_required");
        c.number(&discovery, "dedup_precision_min", 0.0, 1.0);
        c.number(&discovery, "false_positive_rate_max", 0.0, 1.0);
        c.number(&discovery, "entity_link_confidence_min", 0.0, 1.0);
        c.integer_min(&discovery, "max_candidates_per_entity", 1);
    }

    if let Some(ingestion) = c.object(&root, "ingestion") {
        c.boolean(&ingestion, "idempotency_key_required");
        c.number(&ingestion, "duplicate_suppression_rate_min", 0.0, 1.0);
        c.number(&ingestion, "max_parse_error_rate", 0.0, 1.0);
        c.boolean(&ingestion, "pii_redaction_required");
        c.integer_min(&ingestion, "max_batch_latency_ms", 1);
    }

    check_governance_block(&mut c, &root);
    c.finish()
}

/// Validate an `mcp_trust_policy` document.
#[must_use]
pub fn validate_mcp_trust_policy(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::McpTrust);

    let tiers = c.string_list(&root, "trust_tiers");
    c.one_of(&root, "default_trust_tier", &tiers);
    let actions = c.string_list(&root, "tool_actions");
    c.one_of(&root, "default_tool_action", &actions);

    if let Some(controls) = c.object(&root, "tier_controls") {
        for tier in &tiers {
            let Some(tier_controls) = c.member_object(&controls, tier) else {
                continue;
            };
            for flag in TIER_CONTROL_FLAGS {
                c.boolean(&tier_controls, flag);
            }
        }
    }

    c.finish()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_transport() -> Value {
        json!({
            "_artifact": "transport_policy",
            "_config_version": 1,
            "allowed_modes": ["http", "websocket"],
            "default_mode": "http",
            "provider_overrides": {
                "slack": {
                    "mode": "websocket",
                    "fallback_mode": "http",
                    "max_parallel_sockets": 4,
                    "retry_on_transient_failure": true
                }
            }
        })
    }

    fn valid_knowledge() -> Value {
        json!({
            "_artifact": "knowledge_retrieval_policy",
            "_config_version": 1,
            "allowed_modes": ["lexical", "semantic"],
            "default_mode": "lexical",
            "indexes": {
                "lexical": {"enabled": true, "allowed_ledgers": ["job_cards"], "max_candidates": 50},
                "semantic": {"enabled": false, "allowed_ledgers": ["job_cards"], "max_candidates": 20}
            },
            "query_constraints": {
                "max_query_length": 512,
                "max_top_k": 8,
                "max_context_tokens": 4000,
                "min_similarity": 0.35,
                "min_citation_count": 1
            },
            "security": {
                "redact_secrets": true,
                "enforce_ledger_allowlist": true,
                "blocked_pattern_refs": ["secrets.default"]
            },
            "fallback": {
                "on_empty_result": "answer_without_context",
                "on_policy_violation": "refuse",
                "emit_governance_event": true
            },
            "governance": {
                "emit_events": ["retrieval.blocked"],
                "reason_codes": ["POLICY_BLOCK"]
            }
        })
    }

    fn valid_mcp() -> Value {
        let controls = json!({
            "allow_write_tools": false,
            "require_operator_approval": true,
            "egress_logging_required": true
        });
        json!({
            "_artifact": "mcp_trust_policy",
            "_config_version": 1,
            "trust_tiers": ["untrusted", "trusted"],
            "default_trust_tier": "untrusted",
            "tool_actions": ["read", "write"],
            "default_tool_action": "read",
            "tier_controls": {"untrusted": controls, "trusted": controls}
        })
    }

    #[test]
    fn transport_valid_and_membership() {
        assert!(validate_transport_policy(&valid_transport()).ok);

        let mut doc = valid_transport();
        doc["default_mode"] = json!("grpc");
        doc["provider_overrides"]["slack"]["fallback_mode"] = json!("carrier_pigeon");
        doc["provider_overrides"]["slack"]["max_parallel_sockets"] = json!(0);
        let report = validate_transport_policy(&doc);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn transport_overrides_are_optional() {
        let mut doc = valid_transport();
        if let Some(map) = doc.as_object_mut() {
            map.remove("provider_overrides");
        }
        assert!(validate_transport_policy(&doc).ok);
    }

    #[test]
    fn context_minimums() {
        let doc = json!({
            "_artifact": "context_policy",
            "_config_version": 1,
            "compaction": {
                "compact_threshold_tokens": 1999,
                "post_compaction_target_tokens": 1000,
                "preserve_sections": ["system", "open_tasks"]
            },
            "prompt_cache": {"max_prefix_segments": 1}
        });
        let report = validate_context_policy(&doc);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "compaction.compact_threshold_tokens");
    }

    #[test]
    fn knowledge_retrieval_valid() {
        assert!(validate_knowledge_retrieval_policy(&valid_knowledge()).ok);
    }

    #[test]
    fn knowledge_retrieval_accumulates_across_sections() {
        let mut doc = valid_knowledge();
        doc["indexes"]["vector"] = json!({"enabled": "yes", "allowed_ledgers": [], "max_candidates": 0});
        doc["query_constraints"]["max_query_length"] = json!(16);
        doc["query_constraints"]["min_similarity"] = json!(1.2);
        doc["security"]["blocked_pattern_refs"] = json!([]);
        doc["governance"]["reason_codes"] = json!([]);
        let report = validate_knowledge_retrieval_policy(&doc);
        let paths: Vec<&str> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "indexes.vector",
                "indexes.vector.enabled",
                "indexes.vector.allowed_ledgers",
                "indexes.vector.max_candidates",
                "query_constraints.max_query_length",
                "query_constraints.min_similarity",
                "security.blocked_pattern_refs",
                "governance.reason_codes"
            ]
        );
    }

    #[test]
    fn discovery_ingestion_rates() {
        let doc = json!({
            "_artifact": "discovery_ingestion_quality_policy",
            "_config_version": 1,
            "discovery": {
                "incremental_cursor_required": true,
                "dedup_precision_min": 0.95,
                "false_positive_rate_max": 0.02,
                "entity_link_confidence_min": 0.8,
                "max_candidates_per_entity": 5
            },
            "ingestion": {
                "idempotency_key_required": true,
                "duplicate_suppression_rate_min": 0.99,
                "max_parse_error_rate": 1.01,
                "pii_redaction_required": "always",
                "max_batch_latency_ms": 30000
            },
            "governance": {"emit_events": ["ingest.rejected"], "reason_codes": ["PARSE_ERROR"]}
        });
        let report = validate_discovery_ingestion_quality_policy(&doc);
        let codes: Vec<IssueCode> = report.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![IssueCode::NumberOutOfRange, IssueCode::BooleanRequired]);
    }

    #[test]
    fn mcp_trust_valid() {
        assert!(validate_mcp_trust_policy(&valid_mcp()).ok);
    }

    #[test]
    fn mcp_trust_requires_controls_per_tier() {
        let mut doc = valid_mcp();
        doc["default_tool_action"] = json!("delete");
        if let Some(controls) = doc["tier_controls"].as_object_mut() {
            controls.remove("trusted");
        }
        doc["tier_controls"]["untrusted"]["allow_write_tools"] = json!(null);
        let report = validate_mcp_trust_policy(&doc);
        let paths: Vec<&str> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "default_tool_action",
                "tier_controls.untrusted.allow_write_tools",
                "tier_controls.trusted"
            ]
        );
    }
}
