//! The relay handler: one inbound POST in, one upstream call, one reply out.

use crate::config::{RelayConfig, UpstreamTarget};
use crate::cors::CorsPolicy;
use crate::error::{RelayError, Result};
use crate::http::{Method, RelayRequest, RelayResponse};
use crate::payload;
use crate::upstream::{Upstream, UpstreamReply};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Forwards browser POST requests to the configured inference endpoint.
///
/// The handler holds no per-request state and is shared across
/// connections behind an `Arc`.
pub struct RelayHandler {
    config: RelayConfig,
    cors: CorsPolicy,
    upstream: Arc<dyn Upstream>,
}

impl RelayHandler {
    pub fn new(config: RelayConfig, upstream: Arc<dyn Upstream>) -> Self {
        let cors = CorsPolicy::from_config(&config);
        Self {
            config,
            cors,
            upstream,
        }
    }

    /// Handle one request. Never fails: every error becomes a reply, and
    /// every reply carries the CORS headers.
    pub async fn handle(&self, request: RelayRequest) -> RelayResponse {
        match self.fetch(request).await {
            Ok(response) => self.cors.apply(response),
            Err(e) => self.error_response(e),
        }
    }

    /// Turn a failure into a reply, logging it on the way.
    pub fn error_response(&self, err: RelayError) -> RelayResponse {
        match &err {
            RelayError::MethodNotAllowed(_) | RelayError::BodyRead(_) => {
                debug!("Rejected request: {}", err)
            }
            RelayError::BodyTooLarge => warn!("Rejected request: {}", err),
            RelayError::MissingConfig(_) => error!("Relay misconfigured: {}", err),
            _ => error!("Proxy error: {}", err),
        }
        self.cors.apply(err.into_response())
    }

    async fn fetch(&self, request: RelayRequest) -> Result<RelayResponse> {
        match request.method {
            Method::Options => return Ok(self.cors.preflight()),
            Method::Post => {}
            other => return Err(RelayError::MethodNotAllowed(other.to_string())),
        }

        let target = self.config.upstream_target()?;
        let body = payload::normalize(request.body.as_deref(), self.config.payload_policy);
        let reply = self.call_upstream(&target, &body).await?;
        Ok(translate(reply))
    }

    async fn call_upstream(
        &self,
        target: &UpstreamTarget,
        body: &Value,
    ) -> Result<UpstreamReply> {
        debug!(
            "Forwarding to {} via {} upstream",
            endpoint_host(&target.endpoint),
            self.upstream.name()
        );

        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.upstream.post_json(target, body)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::UpstreamTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

/// Host part of the endpoint, for logs. Paths and query strings can carry
/// secrets and are never logged.
fn endpoint_host(endpoint: &str) -> String {
    reqwest::Url::parse(endpoint)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "<invalid endpoint>".to_string())
}

/// Convert an upstream reply into the caller's reply, keeping the upstream
/// status. JSON bodies are re-emitted as JSON; anything else, including a
/// body that claims to be JSON but does not parse, goes back as text.
pub fn translate(reply: UpstreamReply) -> RelayResponse {
    if !reply.status.is_success() {
        warn!("Upstream answered with status {}", reply.status.0);
    }

    if reply.is_json() {
        let parsed = serde_json::from_slice::<Value>(&reply.body)
            .and_then(|value| RelayResponse::json(reply.status, &value));
        match parsed {
            Ok(response) => return response,
            Err(e) => warn!("Upstream sent invalid JSON, relaying as text: {}", e),
        }
    }

    RelayResponse::text(reply.status, reply.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;

    #[test]
    fn test_endpoint_host_drops_path_and_query() {
        assert_eq!(
            endpoint_host("https://ml.example.net/score?code=secret"),
            "ml.example.net"
        );
        assert_eq!(endpoint_host("not a url"), "<invalid endpoint>");
    }

    #[test]
    fn test_translate_json() {
        let reply = UpstreamReply::new(
            StatusCode::OK,
            Some("application/json; charset=utf-8"),
            r#"{"result": "ok"}"#,
        );
        let response = translate(reply);
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.text_body(), Some(r#"{"result":"ok"}"#.to_string()));
        assert_eq!(
            response.get_header("Content-Type"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_translate_invalid_json_falls_back_to_text() {
        let reply = UpstreamReply::new(StatusCode::OK, Some("application/json"), "{not json");
        let response = translate(reply);
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.text_body(), Some("{not json".to_string()));
        assert_eq!(
            response.get_header("Content-Type"),
            Some(&"text/plain".to_string())
        );
    }

    #[test]
    fn test_translate_keeps_error_status() {
        let reply = UpstreamReply::new(
            StatusCode(424),
            Some("application/json"),
            r#"{"error":"model failed"}"#,
        );
        let response = translate(reply);
        assert_eq!(response.status, StatusCode(424));
        let body: Value = response.json_body().unwrap().unwrap();
        assert_eq!(body["error"], "model failed");
    }

    #[test]
    fn test_translate_missing_content_type_is_text() {
        let reply = UpstreamReply::new(StatusCode::OK, None, r#"{"result":"ok"}"#);
        let response = translate(reply);
        assert_eq!(
            response.get_header("Content-Type"),
            Some(&"text/plain".to_string())
        );
    }
}
