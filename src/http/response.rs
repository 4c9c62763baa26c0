//! Outbound reply type produced by the relay.

use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// Check if the status code indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

/// A reply ready to be written back to the caller.
#[derive(Debug, Clone)]
pub struct RelayResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// HTTP headers.
    pub headers: HashMap<String, String>,
    /// Response body. `None` is written as an empty body.
    pub body: Option<Bytes>,
}

impl RelayResponse {
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create an empty 200 response.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Create a JSON response with the given status.
    pub fn json<T: Serialize>(
        status: impl Into<StatusCode>,
        data: &T,
    ) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(data)?;
        Ok(Self::new(status)
            .header("Content-Type", "application/json")
            .body(body))
    }

    /// Create a `text/plain` response with the given status.
    pub fn text(status: impl Into<StatusCode>, content: impl Into<Bytes>) -> Self {
        Self::new(status)
            .header("Content-Type", "text/plain")
            .body(content)
    }

    /// Add a header to the response.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers.get(key)
    }

    /// Get the body as text if present.
    pub fn text_body(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).to_string())
    }

    /// Parse the body as JSON if present.
    pub fn json_body<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Option<Result<T, serde_json::Error>> {
        self.body.as_ref().map(|b| serde_json::from_slice(b))
    }
}

impl Default for RelayResponse {
    fn default() -> Self {
        Self::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response_is_compact() {
        let response =
            RelayResponse::json(StatusCode::OK, &serde_json::json!({ "result": "ok" })).unwrap();
        assert_eq!(response.text_body(), Some(r#"{"result":"ok"}"#.to_string()));
        assert_eq!(
            response.get_header("Content-Type"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_status_code_helpers() {
        assert!(StatusCode::OK.is_success());
        assert!(!StatusCode::METHOD_NOT_ALLOWED.is_success());
        assert!(!StatusCode::SERVICE_UNAVAILABLE.is_success());
    }
}
