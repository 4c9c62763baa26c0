//! Relay configuration.
//!
//! Everything the handler needs is resolved once, at startup, into a
//! [`RelayConfig`] and injected into [`RelayHandler`](crate::relay::RelayHandler).
//! Endpoint and credential stay optional here: a missing value is reported
//! per request as a 500 rather than preventing the process from starting.

use crate::error::{ConfigError, RelayError};
use crate::payload::PayloadPolicy;
use hyper::header::HeaderValue;
use std::time::Duration;

/// Environment variables holding the upstream URL, first present wins.
pub const ENDPOINT_VARS: [&str; 2] = ["AZURE_ML_ENDPOINT", "UPSTREAM_ENDPOINT"];
/// Environment variables holding the bearer credential, first present wins.
pub const API_KEY_VARS: [&str; 2] = ["AZURE_ML_KEY", "UPSTREAM_API_KEY"];
pub const ALLOW_ORIGIN_VAR: &str = "CORS_ALLOW_ORIGIN";
pub const ALLOW_HEADERS_VAR: &str = "CORS_ALLOW_HEADERS";
pub const TIMEOUT_VAR: &str = "UPSTREAM_TIMEOUT_MS";
pub const PAYLOAD_POLICY_VAR: &str = "RELAY_PAYLOAD_POLICY";

pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_ALLOW_ORIGIN: &str = "*";
pub const DEFAULT_ALLOW_HEADERS: &str = "Content-Type";
/// Header set for clients that also send their own `Authorization`.
pub const PERMISSIVE_ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Where and how to reach the upstream for a single call.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub endpoint: String,
    pub api_key: String,
}

impl std::fmt::Debug for UpstreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamTarget")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Configuration for the relay handler.
#[derive(Clone)]
pub struct RelayConfig {
    /// Upstream inference endpoint URL.
    pub endpoint: Option<String>,
    /// Bearer credential sent to the upstream.
    pub api_key: Option<String>,
    /// Value of `Access-Control-Allow-Origin`.
    pub allow_origin: String,
    /// Value of `Access-Control-Allow-Headers`.
    pub allow_headers: String,
    /// Bound on the whole upstream call.
    pub timeout: Duration,
    /// What to do with body fields the upstream does not recognize.
    pub payload_policy: PayloadPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            allow_origin: DEFAULT_ALLOW_ORIGIN.to_string(),
            allow_headers: DEFAULT_ALLOW_HEADERS.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            payload_policy: PayloadPolicy::default(),
        }
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("allow_origin", &self.allow_origin)
            .field("allow_headers", &self.allow_headers)
            .field("timeout", &self.timeout)
            .field("payload_policy", &self.payload_policy)
            .finish()
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.endpoint = first_present(&lookup, &ENDPOINT_VARS);
        config.api_key = first_present(&lookup, &API_KEY_VARS);

        if let Some(origin) = first_present(&lookup, &[ALLOW_ORIGIN_VAR]) {
            config.allow_origin = header_value(ALLOW_ORIGIN_VAR, origin)?;
        }
        if let Some(headers) = first_present(&lookup, &[ALLOW_HEADERS_VAR]) {
            config.allow_headers = header_value(ALLOW_HEADERS_VAR, headers)?;
        }
        if let Some(raw) = first_present(&lookup, &[TIMEOUT_VAR]) {
            let millis: u64 = raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: TIMEOUT_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.timeout = Duration::from_millis(millis);
        }
        if let Some(raw) = first_present(&lookup, &[PAYLOAD_POLICY_VAR]) {
            config.payload_policy =
                raw.parse()
                    .map_err(|reason: String| ConfigError::InvalidValue {
                        name: PAYLOAD_POLICY_VAR,
                        value: raw.clone(),
                        reason,
                    })?;
        }

        Ok(config)
    }

    /// Set the upstream endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the bearer credential.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the allowed CORS origin.
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = origin.into();
        self
    }

    /// Set the allowed CORS request headers.
    pub fn allow_headers(mut self, headers: impl Into<String>) -> Self {
        self.allow_headers = headers.into();
        self
    }

    /// Set the upstream timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the payload policy.
    pub fn payload_policy(mut self, policy: PayloadPolicy) -> Self {
        self.payload_policy = policy;
        self
    }

    /// Resolve the upstream target, failing if either half is missing.
    pub fn upstream_target(&self) -> Result<UpstreamTarget, RelayError> {
        let endpoint = self.endpoint.clone().ok_or_else(|| {
            RelayError::MissingConfig(format!(
                "Upstream endpoint is not configured (set {})",
                ENDPOINT_VARS.join(" or ")
            ))
        })?;
        let api_key = self.api_key.clone().ok_or_else(|| {
            RelayError::MissingConfig(format!(
                "Upstream API key is not configured (set {})",
                API_KEY_VARS.join(" or ")
            ))
        })?;
        Ok(UpstreamTarget { endpoint, api_key })
    }
}

/// Reject values that could not be sent as an HTTP header, since they end
/// up on every reply.
fn header_value(name: &'static str, value: String) -> Result<String, ConfigError> {
    match HeaderValue::from_str(&value) {
        Ok(_) => Ok(value),
        Err(e) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}

/// Return the first non-empty value among `names`.
pub(crate) fn first_present<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.endpoint, None);
        assert_eq!(config.api_key, None);
        assert_eq!(config.allow_origin, "*");
        assert_eq!(config.allow_headers, "Content-Type");
        assert_eq!(config.timeout, Duration::from_millis(120_000));
        assert_eq!(config.payload_policy, PayloadPolicy::Passthrough);
    }

    #[test]
    fn test_first_present_variable_wins() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("AZURE_ML_ENDPOINT", "https://a.example/score"),
            ("UPSTREAM_ENDPOINT", "https://b.example/score"),
            ("UPSTREAM_API_KEY", "key-b"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("https://a.example/score"));
        assert_eq!(config.api_key.as_deref(), Some("key-b"));
    }

    #[test]
    fn test_empty_variable_counts_as_absent() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("AZURE_ML_ENDPOINT", ""),
            ("UPSTREAM_ENDPOINT", "https://b.example/score"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("https://b.example/score"));
    }

    #[test]
    fn test_overrides() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("CORS_ALLOW_ORIGIN", "https://app.example"),
            ("CORS_ALLOW_HEADERS", PERMISSIVE_ALLOW_HEADERS),
            ("UPSTREAM_TIMEOUT_MS", "5000"),
            ("RELAY_PAYLOAD_POLICY", "strict"),
        ]))
        .unwrap();
        assert_eq!(config.allow_origin, "https://app.example");
        assert_eq!(config.allow_headers, "Content-Type, Authorization");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.payload_policy, PayloadPolicy::Strict);
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let err = RelayConfig::from_lookup(lookup(&[("UPSTREAM_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("UPSTREAM_TIMEOUT_MS"));
    }

    #[test]
    fn test_cors_values_must_be_valid_headers() {
        let err = RelayConfig::from_lookup(lookup(&[(
            "CORS_ALLOW_ORIGIN",
            "https://a.example\u{1}",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("CORS_ALLOW_ORIGIN"));

        let err = RelayConfig::from_lookup(lookup(&[(
            "CORS_ALLOW_HEADERS",
            "Content-Type\u{7f}",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("CORS_ALLOW_HEADERS"));
    }

    #[test]
    fn test_missing_target_is_reported() {
        let config = RelayConfig::new().endpoint("https://a.example/score");
        let err = config.upstream_target().unwrap_err();
        assert!(matches!(err, RelayError::MissingConfig(_)));
        assert!(err.to_string().contains("AZURE_ML_KEY"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = RelayConfig::new()
            .endpoint("https://a.example/score")
            .api_key("super-secret");
        let printed = format!("{:?} {:?}", config, config.upstream_target().unwrap());
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
