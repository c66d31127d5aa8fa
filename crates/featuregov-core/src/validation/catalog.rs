//! Validators for the catalog-style documents: activation experiments and
//! the connector certification matrix.

use serde_json::Value;

use super::checker::Checker;
use super::{PolicyKind, ValidationReport};

const EXPERIMENT_STRING_FIELDS: [&str; 5] = [
    "feature_id",
    "jtbd",
    "activation_hypothesis",
    "owner",
    "success_metric",
];

/// Validate a `feature_activation_catalog` document.
#[must_use]
pub fn validate_activation_catalog(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::ActivationCatalog);

    if let Some(experiments) = c.list(&root, "experiments") {
        for (index, item) in experiments.iter().enumerate() {
            let Some(experiment) = c.element_object(item, format!("experiments[{index}]")) else {
                continue;
            };
            for field in EXPERIMENT_STRING_FIELDS {
                c.string(&experiment, field);
            }
            c.positive_number(&experiment, "target_delta");
        }
    }

    c.finish()
}

/// Validate a `connector_certification_matrix` document.
#[must_use]
pub fn validate_connector_certification_matrix(document: &Value) -> ValidationReport {
    let mut c = Checker::new();
    let Some(root) = c.root(document) else {
        return c.finish();
    };
    c.header(&root, PolicyKind::ConnectorCertificationMatrix);

    for (_, provider) in c.entries(&root, "providers") {
        c.list(&provider, "required_checks");
        if let Some(slo) = c.object(&provider, "slo") {
            c.number(&slo, "success_rate_min", 0.0, 1.0);
            c.integer_min(&slo, "p95_latency_ms_max", 1);
        }
    }

    c.finish()
}
