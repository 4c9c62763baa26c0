//! CORS headers attached to every reply.

use crate::config::RelayConfig;
use crate::http::RelayResponse;

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";

/// Methods advertised to browsers. Only these two are ever served.
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allow_origin: String,
    pub allow_headers: String,
}

impl CorsPolicy {
    pub fn new(allow_origin: impl Into<String>, allow_headers: impl Into<String>) -> Self {
        Self {
            allow_origin: allow_origin.into(),
            allow_headers: allow_headers.into(),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(&config.allow_origin, &config.allow_headers)
    }

    /// Add the CORS headers to `response`, replacing any already present.
    pub fn apply(&self, response: RelayResponse) -> RelayResponse {
        response
            .header(ALLOW_ORIGIN, &self.allow_origin)
            .header(ALLOW_METHODS, ALLOWED_METHODS)
            .header(ALLOW_HEADERS, &self.allow_headers)
    }

    /// Reply to a preflight request: 200, no body.
    pub fn preflight(&self) -> RelayResponse {
        self.apply(RelayResponse::ok())
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}
