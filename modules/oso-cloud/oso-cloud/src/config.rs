//! Configuration for the Oso Cloud client.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OsoCloudConfig {
    /// Base URL of the primary Oso Cloud endpoint.
    pub url: String,

    /// API key sent as a bearer token.
    pub api_key: SecretString,

    /// Secondary host tried once when the primary fails a read-only call.
    pub fallback_url: Option<String>,

    /// Data bindings file forwarded to the local-query endpoints.
    pub data_bindings: Option<PathBuf>,

    /// Per-request transport timeout, in seconds.
    pub timeout_secs: u64,

    /// Retry budget for the primary endpoint.
    pub retry: RetryConfig,
}

impl Default for OsoCloudConfig {
    fn default() -> Self {
        Self {
            url: "https://api.osohq.com".to_owned(),
            api_key: SecretString::from(String::new()),
            fallback_url: None,
            data_bindings: None,
            timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl OsoCloudConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry policy for the primary endpoint.
///
/// The delay before retry `n` (starting at 0) is `min_backoff_ms * 2^n`,
/// capped at `max_backoff_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: u32,
    pub min_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_backoff_ms: 10,
            max_backoff_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Delay before the retry following attempt `attempt`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        let max = self.max_backoff_ms.max(self.min_backoff_ms);
        Duration::from_millis(self.min_backoff_ms.saturating_mul(factor).min(max))
    }
}
