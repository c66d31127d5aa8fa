//! # featuregov
//!
//! The command-line caller of `featuregov-core`.
//!
//! The engine is pure; this crate owns everything around it: configuration,
//! reading policy files and ledgers, and rendering results.

pub mod cli;
pub mod config;
