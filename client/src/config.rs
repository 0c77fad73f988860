use crate::errors::ClientError;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("base_url must be http or https")]
    UnsupportedScheme,

    #[error("http_timeout_secs cannot be 0")]
    ZeroTimeout,
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_grace_window_ms() -> u64 {
    1000
}

fn default_settle_delay_ms() -> u64 {
    1500
}

/// Backend connection and coordination timing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the analysis backend
    ///
    /// Note: Uses the `url::Url` type for compile-time URL validation.
    /// Invalid URLs will be rejected during config deserialization.
    pub base_url: Url,
    /// Whole-request timeout applied by the transport
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// How long a settled in-flight entry stays joinable
    #[serde(default = "default_grace_window_ms")]
    pub grace_window_ms: u64,
    /// Wait between triggering an auth refresh and probing the session.
    /// Inherited heuristic; no guarantee it outlasts the backend's own
    /// token-refresh latency.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl ClientConfig {
    /// Validates the client configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ValidationError::UnsupportedScheme);
        }
        if self.http_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Build the shared HTTP client. The cookie jar is on so the backend's
    /// session cookie rides every call, like the browser's
    /// include-credentials mode.
    pub fn http_client(&self) -> Result<reqwest::Client, ClientError> {
        reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(self.http_timeout_secs))
            .build()
            .map_err(ClientError::from)
    }
}
