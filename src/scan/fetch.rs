// src/scan/fetch.rs
// =============================================================================
// This module fetches the Content-Security-Policy header of a target URL.
//
// Key behaviour:
// - One GET per target, no retries
// - Per-request timeout (10s) under a client-wide timeout (15s)
// - TLS certificates are NOT verified: we want the header, not trust
// - A missing header is not an error, just "nothing to scan"
// - Header bytes that aren't valid UTF-8 are replaced, not rejected, so one
//   odd byte doesn't hide the rest of the policy
//
// Rust concepts:
// - thiserror: Derives std::error::Error for our FetchError enum
// - From<reqwest::Error>: Lets `?` convert reqwest errors for us
// =============================================================================

use anyhow::{Context, Result};
use reqwest::header::CONTENT_SECURITY_POLICY;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use super::config::ScanConfig;

const USER_AGENT: &str = concat!("csp-harvest/", env!("CARGO_PKG_VERSION"));

// Why a single fetch failed
//
// The worker skips the target either way; the variant only shows up in logs.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL couldn't be turned into a request (bad scheme, bad syntax...)
    #[error("invalid request: {0}")]
    InvalidRequest(reqwest::Error),
    /// No response within the request timeout
    #[error("request timed out: {0}")]
    Timeout(reqwest::Error),
    /// DNS failure, connection refused, TLS handshake failure, etc.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            FetchError::InvalidRequest(error)
        } else if error.is_timeout() {
            FetchError::Timeout(error)
        } else {
            FetchError::Transport(error)
        }
    }
}

// Shared HTTP client used by every worker
//
// reqwest::Client keeps a connection pool inside an Arc, so one Fetcher
// serves all workers.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    request_timeout: Duration,
}

impl Fetcher {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.client_timeout)
            .danger_accept_invalid_certs(true)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            request_timeout: config.request_timeout,
        })
    }

    // Fetches `target` and returns its Content-Security-Policy header
    //
    // Returns:
    //   Ok(Some(csp)) = header found
    //   Ok(None)      = no header, or a blank one
    //   Err(e)        = the request never produced a response
    //
    // The response status is ignored: a 404 page can carry a CSP too.
    pub async fn fetch_csp(&self, target: &str) -> Result<Option<String>, FetchError> {
        let request = self
            .client
            .get(target)
            .timeout(self.request_timeout)
            .build()?;

        let response = self.client.execute(request).await?;

        let csp = response
            .headers()
            .get(CONTENT_SECURITY_POLICY)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(csp)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. How does `?` turn a reqwest::Error into a FetchError?
//    - `?` calls From::from on the error before returning it
//    - We wrote `impl From<reqwest::Error> for FetchError` above, which
//      picks the variant by asking the error what kind it is
//    - thiserror only writes the Display and Error impls for us
//
// 2. What is from_utf8_lossy?
//    - Turns bytes into text, swapping invalid sequences for U+FFFD
//    - It returns a Cow<str>: borrowed when the bytes were already valid,
//      owned when something had to be replaced
//
// 3. Why two timeouts?
//    - The client timeout covers every request the client ever makes
//    - RequestBuilder::timeout overrides it for this one GET
// -----------------------------------------------------------------------------
