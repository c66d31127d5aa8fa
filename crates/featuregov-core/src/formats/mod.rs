//! # Formats
//!
//! Pure decoding of the line-delimited ledgers the engine reads from.
//! File I/O lives in the app layer.

pub mod ledger;

pub use ledger::{MAX_LEDGER_LINE_BYTES, decode_ledger_line, parse_ledger};
