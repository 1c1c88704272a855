//! Connection settings for the game API.
//!
//! Loaded from environment variables so the token never lands in a config
//! file checked into a repository.

use std::time::Duration;

use crate::error::ApiError;

/// Default game API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.artifactsmmo.com";

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without a trailing slash.
    pub api_url: String,
    /// Account token sent as a bearer token.
    pub token: String,
    /// Retries for network failures and 5xx responses.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each attempt.
    pub retry_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `ARTIFACTS_TOKEN` -- account API token
    ///
    /// Optional variables:
    /// - `ARTIFACTS_API_URL` -- API base URL (default `https://api.artifactsmmo.com`)
    /// - `ARTIFACTS_MAX_RETRIES` -- transport retries (default 3)
    /// - `ARTIFACTS_RETRY_DELAY_MS` -- first retry delay in milliseconds (default 500)
    /// - `ARTIFACTS_TIMEOUT_MS` -- request timeout in milliseconds (default 30000)
    pub fn from_env() -> Result<Self, ApiError> {
        let token = std::env::var("ARTIFACTS_TOKEN")
            .map_err(|e| ApiError::Config(format!("missing required env var ARTIFACTS_TOKEN: {e}")))?;
        Self::from_parts(
            token,
            std::env::var("ARTIFACTS_API_URL").ok(),
            std::env::var("ARTIFACTS_MAX_RETRIES").ok(),
            std::env::var("ARTIFACTS_RETRY_DELAY_MS").ok(),
            std::env::var("ARTIFACTS_TIMEOUT_MS").ok(),
        )
    }

    fn from_parts(
        token: String,
        api_url: Option<String>,
        max_retries: Option<String>,
        retry_delay_ms: Option<String>,
        timeout_ms: Option<String>,
    ) -> Result<Self, ApiError> {
        if token.trim().is_empty() {
            return Err(ApiError::Config("ARTIFACTS_TOKEN is empty".to_owned()));
        }
        let api_url = api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let max_retries: u32 = parse_or("ARTIFACTS_MAX_RETRIES", max_retries, 3)?;
        let retry_delay_ms: u64 = parse_or("ARTIFACTS_RETRY_DELAY_MS", retry_delay_ms, 500)?;
        let timeout_ms: u64 = parse_or("ARTIFACTS_TIMEOUT_MS", timeout_ms, 30_000)?;

        Ok(Self {
            api_url,
            token,
            max_retries,
            retry_delay: Duration::from_millis(retry_delay_ms),
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, ApiError>
where
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |v| {
        v.parse()
            .map_err(|e| ApiError::Config(format!("invalid {name}: {e}")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let config = ClientConfig::from_parts("secret".to_owned(), None, None, None, None);
        let config = config.ok();
        assert_eq!(config.as_ref().map(|c| c.api_url.as_str()), Some(DEFAULT_API_URL));
        assert_eq!(config.as_ref().map(|c| c.max_retries), Some(3));
        assert_eq!(config.map(|c| c.timeout), Some(Duration::from_secs(30)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ClientConfig::from_parts(
            "secret".to_owned(),
            Some("http://localhost:8000/".to_owned()),
            None,
            None,
            None,
        );
        assert_eq!(config.ok().map(|c| c.api_url), Some("http://localhost:8000".to_owned()));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let config = ClientConfig::from_parts(
            "secret".to_owned(),
            None,
            Some("many".to_owned()),
            None,
            None,
        );
        assert!(matches!(config, Err(ApiError::Config(_))));
    }

    #[test]
    fn empty_token_is_rejected() {
        let config = ClientConfig::from_parts("  ".to_owned(), None, None, None, None);
        assert!(config.is_err());
    }
}
