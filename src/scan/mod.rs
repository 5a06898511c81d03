// src/scan/mod.rs
// =============================================================================
// This module does the network side of a scan.
//
// Submodules:
// - config: ScanConfig (worker count, delay, timeouts, output style)
// - fetch: Gets a target's Content-Security-Policy header over HTTP
// - sink: Prints domains to stdout and the optional output file
// - stats: Counters for the summary logged at the end
// - pool: The job queue, the workers, and the dispatcher that feeds them
// =============================================================================

mod config;
mod fetch;
mod pool;
mod sink;
mod stats;

pub use config::{ScanConfig, DEFAULT_DELAY, DEFAULT_WORKERS};
pub use pool::{run_workers, scan_target, ScanContext};
pub use sink::OutputSink;
pub use stats::ScanStats;
