//! # Configuration
//!
//! Where featuregov finds its policy documents, ledgers and registry.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied by the command layer)
//! 2. Environment variables (`FEATUREGOV_POLICY_DIR`)
//! 3. Config file (`--config`, else `featuregov.toml` in the working directory)
//! 4. Compiled defaults
//!
//! ```toml
//! [policies]
//! dir = "sidecars/ted-engine/config"
//!
//! [policies.files]
//! release-gate = "release_gate.json"
//!
//! [ledgers]
//! feature_health = "artifacts/feature_health.jsonl"
//! operating_runs = "artifacts/feature_operating_runs.jsonl"
//! research_triggers = "artifacts/research_triggers.jsonl"
//!
//! [registry]
//! file = "sidecars/ted-engine/config/feature_registry.json"
//! repo_path = "sidecars/ted-engine/config/feature_registry.json"
//! ```

use featuregov_core::primitives::DEFAULT_REGISTRY_PATH;
use featuregov_core::{GovernanceError, PolicyKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "featuregov.toml";

/// Environment variable overriding `[policies].dir`.
pub const POLICY_DIR_ENV: &str = "FEATUREGOV_POLICY_DIR";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Directory holding the policy documents.
    pub dir: PathBuf,
    /// File name overrides keyed by policy kind (short name or artifact tag).
    pub files: BTreeMap<String, String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("sidecars/ted-engine/config"),
            files: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub feature_health: PathBuf,
    pub operating_runs: PathBuf,
    /// JSON array or line-delimited records; a missing file means no triggers.
    pub research_triggers: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            feature_health: PathBuf::from("artifacts/feature_health.jsonl"),
            operating_runs: PathBuf::from("artifacts/feature_operating_runs.jsonl"),
            research_triggers: PathBuf::from("artifacts/research_triggers.jsonl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Where to read the registry from.
    pub file: PathBuf,
    /// Repository-relative path the resolver treats as "the registry changed".
    pub repo_path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_REGISTRY_PATH),
            repo_path: DEFAULT_REGISTRY_PATH.to_string(),
        }
    }
}

// =============================================================================
// GOVERNANCE CONFIG
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub policies: PolicyConfig,
    pub ledgers: LedgerConfig,
    pub registry: RegistryConfig,
}

impl GovernanceConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `featuregov.toml` in the
    /// working directory is used when present, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, GovernanceError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_file(implicit)?
                } else {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Self::default()
                }
            }
        };

        if let Ok(dir) = std::env::var(POLICY_DIR_ENV)
            && !dir.trim().is_empty()
        {
            config.policies.dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, GovernanceError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            GovernanceError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(GovernanceError::Config(format!(
                "Config '{}' is {} bytes, maximum allowed is {} bytes",
                path.display(),
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            GovernanceError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, GovernanceError> {
        toml::from_str(text).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    /// Every key of `[policies.files]` must name a policy kind.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        for key in self.policies.files.keys() {
            key.parse::<PolicyKind>().map_err(|_| {
                GovernanceError::Config(format!("policies.files: unknown policy kind '{key}'"))
            })?;
        }
        Ok(())
    }

    /// Path of the document for `kind`: the configured override, else
    /// `<artifact>.json`, inside the policy directory.
    #[must_use]
    pub fn policy_path(&self, kind: PolicyKind) -> PathBuf {
        let file = self
            .policies
            .files
            .iter()
            .find(|(key, _)| key.parse::<PolicyKind>().ok() == Some(kind))
            .map(|(_, file)| file.clone())
            .unwrap_or_else(|| format!("{}.json", kind.artifact()));
        self.policies.dir.join(file)
    }
}

// =============================================================================
// TESTS
// =============================================================================
