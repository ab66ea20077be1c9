//! Polytiles - polygon to vector tile conversion service
//!
//! This library converts polygon files into tile containers by driving two
//! external tools, `tippecanoe` and `versatiles`, and reports progress while
//! they run.
//!
//! - [`progress`]: composable progress tracking (step lists and sequences)
//! - [`ndjson`]: progress as a newline-delimited JSON byte stream
//! - [`convert`]: the conversion pipeline
//! - [`server`]: HTTP API exposing the pipeline
//! - [`tools`]: external program execution
//! - [`config`] and [`logging`]: ambient setup shared with the CLI

pub mod config;
pub mod convert;
pub mod logging;
pub mod ndjson;
pub mod progress;
pub mod server;
pub mod tools;

/// Crate version, reported by the health endpoint and the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
