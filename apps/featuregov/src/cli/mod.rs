//! # featuregov CLI Module
//!
//! This module implements the CLI interface for featuregov.
//!
//! ## Available Commands
//!
//! - `validate` - Validate policy documents
//! - `validate-all` - Validate every configured policy document
//! - `resolve` - Map changed paths to feature ids
//! - `gate` - Evaluate the release gate for a change
//! - `queue` - Build the feature priority queue
//! - `cadence` - Report operating cadence freshness

mod commands;

use crate::config::GovernanceConfig;
use clap::{Parser, Subcommand};
use featuregov_core::{GovernanceError, PolicyKind};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// featuregov - feature governance decisions
///
/// Validates governance policies, gates releases, ranks feature work and
/// tracks the operating cadence.
#[derive(Parser, Debug)]
#[command(name = "featuregov")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the config file (default: ./featuregov.toml when present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the policy documents (overrides config)
    #[arg(short = 'P', long, global = true)]
    pub policy_dir: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate policy documents
    Validate {
        /// Validate as this kind instead of reading each file's `_artifact`
        #[arg(short, long)]
        kind: Option<PolicyKind>,

        /// Policy files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Validate the configured document of every policy kind
    ValidateAll,

    /// Map changed file paths to feature ids
    Resolve {
        /// Changed file paths
        #[arg(required = true)]
        paths: Vec<String>,

        /// Registry file to read (overrides config)
        #[arg(long)]
        registry: Option<PathBuf>,
    },

    /// Evaluate the release gate for a change
    Gate {
        /// Changed file paths, resolved to features through the registry
        #[arg(long, num_args = 1..)]
        changed: Vec<String>,

        /// Feature ids to evaluate directly
        #[arg(long = "feature", num_args = 1..)]
        features: Vec<String>,

        /// Override reason code
        #[arg(long)]
        reason_code: Option<String>,

        /// Override ticket reference
        #[arg(long)]
        ticket_ref: Option<String>,
    },

    /// Build the feature priority queue
    Queue,

    /// Report operating cadence freshness
    Cadence {
        /// Evaluate at this instant (epoch milliseconds) instead of now
        #[arg(long)]
        now_ms: Option<i64>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
///
/// Returns `Ok(false)` when the command ran but its outcome is a failure.
pub fn execute(cli: Cli) -> Result<bool, GovernanceError> {
    let json_mode = cli.json;

    // Explicit files need no config.
    if let Commands::Validate { kind, files } = &cli.command {
        return cmd_validate(files, *kind, json_mode);
    }

    let mut config = GovernanceConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.policy_dir {
        config.policies.dir = dir;
    }

    match cli.command {
        Commands::Validate { kind, files } => cmd_validate(&files, kind, json_mode),
        Commands::ValidateAll => cmd_validate_all(&config, json_mode),
        Commands::Resolve { paths, registry } => {
            if let Some(file) = registry {
                config.registry.file = file;
            }
            cmd_resolve(&config, &paths, json_mode).map(|()| true)
        }
        Commands::Gate {
            changed,
            features,
            reason_code,
            ticket_ref,
        } => {
            let options = GateOptions {
                changed_paths: changed,
                feature_ids: features,
                reason_code,
                ticket_ref,
            };
            cmd_gate(&config, &options, json_mode)
        }
        Commands::Queue => cmd_queue(&config, json_mode).map(|()| true),
        Commands::Cadence { now_ms } => cmd_cadence(&config, now_ms, json_mode).map(|()| true),
    }
}
