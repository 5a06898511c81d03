// src/scan/config.rs
// =============================================================================
// Settings for one scan run, built from the command line (see cli.rs).
// =============================================================================

use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Number of worker tasks pulling targets off the queue
    pub workers: usize,
    /// How many targets may wait in the queue before the reader blocks
    pub queue_capacity: usize,
    /// Pause each worker takes after finishing a target
    pub delay: Duration,
    /// Print "example.com" instead of "*.example.com"
    pub strip_wildcard: bool,
    /// Timeout for a single GET
    pub request_timeout: Duration,
    /// Upper bound set on the HTTP client itself
    pub client_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_WORKERS,
            delay: DEFAULT_DELAY,
            strip_wildcard: false,
            request_timeout: REQUEST_TIMEOUT,
            client_timeout: CLIENT_TIMEOUT,
        }
    }
}
