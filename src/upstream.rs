//! The outbound call to the inference endpoint.
//!
//! [`Upstream`] is the seam the handler talks through; [`HttpUpstream`] is
//! the real implementation and tests substitute their own.

use crate::config::UpstreamTarget;
use crate::error::RelayError;
use crate::http::StatusCode;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::Value;

/// A fully buffered upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    /// Raw `Content-Type` header, if the upstream sent one.
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamReply {
    pub fn new(
        status: impl Into<StatusCode>,
        content_type: Option<&str>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            status: status.into(),
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// Whether the declared content type is JSON (`application/json` or a
    /// `+json` suffix type), ignoring parameters such as `charset`.
    pub fn is_json(&self) -> bool {
        let Some(content_type) = &self.content_type else {
            return false;
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence == "application/json" || essence.ends_with("+json")
    }
}

/// Something that can deliver one JSON POST to the upstream.
///
/// Implementations perform exactly one attempt. Timeouts are enforced by the
/// caller.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn post_json(
        &self,
        target: &UpstreamTarget,
        body: &Value,
    ) -> Result<UpstreamReply, RelayError>;

    fn name(&self) -> &str {
        "upstream"
    }
}

/// [`Upstream`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new() -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn post_json(
        &self,
        target: &UpstreamTarget,
        body: &Value,
    ) -> Result<UpstreamReply, RelayError> {
        let payload = serde_json::to_vec(body)?;

        let response = self
            .client
            .post(&target.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .bearer_auth(&target.api_key)
            .body(payload)
            .send()
            .await?;

        let status = StatusCode(response.status().as_u16());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_content_type_detection() {
        let json = |ct: Option<&str>| UpstreamReply::new(StatusCode::OK, ct, "").is_json();
        assert!(json(Some("application/json")));
        assert!(json(Some("Application/JSON; charset=utf-8")));
        assert!(json(Some("application/problem+json")));
        assert!(!json(Some("text/plain")));
        assert!(!json(Some("text/json-ish")));
        assert!(!json(None));
    }
}
