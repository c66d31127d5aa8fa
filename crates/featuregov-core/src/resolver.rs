//! # Change Resolver
//!
//! Maps changed file paths to the feature identifiers they plausibly affect.
//!
//! ## Heuristic
//!
//! A feature is "changed" when its identifier, with `_` and `-` removed,
//! appears as a case-insensitive substring of a changed path (with the same
//! characters removed). This is not a dependency graph: a short identifier
//! can match an unrelated path by accident. Callers rely on the current
//! matching behavior, so the false positives are accepted.
//!
//! Editing the registry file itself marks every registered feature as
//! changed.

use std::collections::BTreeSet;

use crate::primitives::{DEFAULT_REGISTRY_PATH, MAX_CHANGED_PATHS};
use crate::types::FeatureRegistry;

/// Resolver configured with the repository path of the registry file.
#[derive(Debug, Clone)]
pub struct ChangeResolver {
    registry_path: String,
}

impl Default for ChangeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeResolver {
    /// Create a resolver using [`DEFAULT_REGISTRY_PATH`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry_path(DEFAULT_REGISTRY_PATH)
    }

    /// Create a resolver for a registry stored at a different path.
    #[must_use]
    pub fn with_registry_path(path: impl AsRef<str>) -> Self {
        Self {
            registry_path: normalize_path(path.as_ref()),
        }
    }

    /// Resolve changed paths to a sorted, de-duplicated list of feature ids.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, changed_paths: &[S], registry: &FeatureRegistry) -> Vec<String> {
        let paths = normalize_paths(changed_paths);

        let ids = registry
            .features
            .iter()
            .map(|feature| feature.id().trim())
            .filter(|id| !id.is_empty());

        if paths.iter().any(|path| self.is_registry_path(path)) {
            tracing::debug!(
                registry = %self.registry_path,
                "registry changed, every feature is affected"
            );
            return ids.map(str::to_string).collect::<BTreeSet<_>>().into_iter().collect();
        }

        let stripped_paths: Vec<String> = paths.iter().map(|p| strip_separators(p)).collect();
        let mut changed = BTreeSet::new();
        for id in ids {
            let token = strip_separators(&id.to_lowercase());
            if token.is_empty() {
                continue;
            }
            if stripped_paths.iter().any(|path| path.contains(&token)) {
                changed.insert(id.to_string());
            }
        }
        changed.into_iter().collect()
    }

    fn is_registry_path(&self, path: &str) -> bool {
        path == self.registry_path
            || path
                .strip_suffix(self.registry_path.as_str())
                .is_some_and(|prefix| prefix.ends_with('/'))
    }
}

/// Resolve with the default registry path.
#[must_use]
pub fn resolve_changed_feature_ids<S: AsRef<str>>(
    changed_paths: &[S],
    registry: &FeatureRegistry,
) -> Vec<String> {
    ChangeResolver::new().resolve(changed_paths, registry)
}

/// Trim, unify separators, case-fold, drop empties, dedupe (first
/// occurrence wins) and cap at [`MAX_CHANGED_PATHS`].
fn normalize_paths<S: AsRef<str>>(changed_paths: &[S]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for raw in changed_paths {
        let path = normalize_path(raw.as_ref());
        if path.is_empty() || !seen.insert(path.clone()) {
            continue;
        }
        out.push(path);
        if out.len() == MAX_CHANGED_PATHS {
            break;
        }
    }
    out
}

fn normalize_path(raw: &str) -> String {
    raw.trim().replace('\\', "/").to_lowercase()
}

fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != '_' && *c != '-').collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Feature;

    fn registry(ids: &[&str]) -> FeatureRegistry {
        FeatureRegistry::new(ids.iter().map(|id| Feature::new(*id)).collect())
    }

    #[test]
    fn module_path_matches_feature() {
        let ids = resolve_changed_feature_ids(
            &["sidecars/ted-engine/modules/builder_lane.mjs"],
            &registry(&["builder_lane"]),
        );
        assert_eq!(ids, vec!["builder_lane".to_string()]);
    }

    #[test]
    fn separators_and_case_are_ignored() {
        let ids = resolve_changed_feature_ids(
            &["Docs\\Builder-Lane\\README.md"],
            &registry(&["builder_lane", "connector_alpha"]),
        );
        assert_eq!(ids, vec!["builder_lane".to_string()]);
    }

    #[test]
    fn registry_edit_returns_every_feature_sorted() {
        let ids = resolve_changed_feature_ids(
            &["README.md", "sidecars/ted-engine/config/feature_registry.json"],
            &registry(&["zeta", "alpha", "mid", "alpha"]),
        );
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn registry_suffix_match_needs_directory_boundary() {
        let resolver = ChangeResolver::new();
        assert!(resolver.is_registry_path("/repo/sidecars/ted-engine/config/feature_registry.json"));
        assert!(!resolver.is_registry_path("xsidecars/ted-engine/config/feature_registry.json"));
    }

    #[test]
    fn custom_registry_path() {
        let resolver = ChangeResolver::with_registry_path("config/features.json");
        let ids = resolver.resolve(&["config/features.json"], &registry(&["a", "b"]));
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn output_is_sorted_and_unique() {
        let ids = resolve_changed_feature_ids(
            &["modules/zeta_flow.mjs", "modules/alpha_flow.mjs", "modules/alpha_flow.mjs"],
            &registry(&["zeta_flow", "alpha_flow"]),
        );
        assert_eq!(ids, vec!["alpha_flow", "zeta_flow"]);
    }

    #[test]
    fn short_tokens_can_false_positive() {
        let ids = resolve_changed_feature_ids(&["modules/mailbox.mjs"], &registry(&["ai"]));
        assert_eq!(ids, vec!["ai"]);
    }

    #[test]
    fn paths_beyond_cap_are_ignored() {
        let mut paths: Vec<String> = (0..MAX_CHANGED_PATHS).map(|i| format!("noise/file_{i}.txt")).collect();
        paths.push("modules/builder_lane.mjs".to_string());
        let ids = resolve_changed_feature_ids(&paths, &registry(&["builder_lane"]));
        assert!(ids.is_empty());
    }

    #[test]
    fn features_without_ids_are_skipped() {
        let mut reg = registry(&["builder_lane"]);
        reg.features.push(Feature::default());
        let ids = resolve_changed_feature_ids(&["sidecars/ted-engine/config/feature_registry.json"], &reg);
        assert_eq!(ids, vec!["builder_lane"]);
    }
}
