//! # featuregov
//!
//! The main binary for the feature-governance engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/featuregov (THE BINARY)           │
//! │                                                      │
//! │  ┌─────────────┐    ┌─────────────┐                  │
//! │  │   CLI       │    │   Config    │                  │
//! │  │  (clap)     │    │   (toml)    │                  │
//! │  └──────┬──────┘    └──────┬──────┘                  │
//! │         └─────────┬────────┘                         │
//! │                   ▼                                  │
//! │          ┌──────────────────┐                        │
//! │          │  featuregov-core │                        │
//! │          │   (THE LOGIC)    │                        │
//! │          └──────────────────┘                        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! featuregov validate-all
//! featuregov gate --changed sidecars/ted-engine/modules/builder_lane.mjs
//! featuregov queue --json
//! featuregov cadence
//! ```

use clap::Parser;
use featuregov::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing. FEATUREGOV_LOG_FORMAT=json enables machine-parseable output.
    // Logs go to stderr so stdout stays clean for results.
    let log_format = std::env::var("FEATUREGOV_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "featuregov=debug,featuregov_core=debug"
    } else {
        "featuregov=info,featuregov_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json {
        print_banner();
    }

    match cli::execute(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the startup banner to stderr.
fn print_banner() {
    eprintln!("featuregov v{} - feature governance engine", env!("CARGO_PKG_VERSION"));
    eprintln!();
}
