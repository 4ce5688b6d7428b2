/// WRA open data API client
///
/// Downloads the raw payload of a configured source. The whole body is
/// buffered before returning; nothing is streamed and nothing is retried.
/// A failed download aborts the lane, and the scheduler re-running the job
/// is the retry policy.
///
/// API catalogue: https://opendata.wra.gov.tw

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{ConfigError, FetchError};

// ============================================================================
// Fetcher seam
// ============================================================================

/// Retrieves a raw byte payload from a remote endpoint.
pub trait Fetcher {
    fn fetch(&self, endpoint: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, endpoint: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(endpoint)
    }
}

// ============================================================================
// HTTP client configuration
// ============================================================================

/// `[http]` section of the mirror configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout. Unset keeps the client default.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
    /// The upstream host has served incomplete certificate chains before.
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: None,
            user_agent: concat!("twr_mirror/", env!("CARGO_PKG_VERSION")).to_string(),
            accept_invalid_certs: false,
        }
    }
}

// ============================================================================
// HTTP fetcher
// ============================================================================

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(|e| ConfigError::Client {
            component: "HTTP client",
            cause: e.to_string(),
        })?;

        Ok(HttpFetcher { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, endpoint: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(endpoint)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        check_status(response.status())?;

        let body = response
            .bytes()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(body.to_vec())
    }
}

/// Only 200 OK counts as success; any other status is a transport failure
/// carrying the status text.
fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(FetchError::Status(status.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
