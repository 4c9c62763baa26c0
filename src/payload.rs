//! Inbound body normalization.
//!
//! The relay never rejects a body. Anything that is not valid JSON becomes
//! `{}`, and the [`PayloadPolicy`] decides whether fields outside
//! [`RECOGNIZED_FIELDS`] reach the upstream.

use serde_json::{Map, Value};

/// Top-level body fields the inference endpoint understands.
pub const RECOGNIZED_FIELDS: [&str; 5] =
    ["messages", "prompt", "context", "parameters", "return_json"];

/// Handling of body fields outside [`RECOGNIZED_FIELDS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadPolicy {
    /// Forward the parsed body exactly as received.
    #[default]
    Passthrough,
    /// Forward only the recognized fields that are present.
    Strict,
}

impl std::str::FromStr for PayloadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passthrough" => Ok(PayloadPolicy::Passthrough),
            "strict" => Ok(PayloadPolicy::Strict),
            other => Err(format!(
                "unknown payload policy '{}', expected 'passthrough' or 'strict'",
                other
            )),
        }
    }
}

impl std::fmt::Display for PayloadPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadPolicy::Passthrough => write!(f, "passthrough"),
            PayloadPolicy::Strict => write!(f, "strict"),
        }
    }
}

/// Parse a raw body, substituting an empty object when it is missing or
/// not JSON.
pub fn parse_body(body: Option<&[u8]>) -> Value {
    let Some(bytes) = body.filter(|b| !b.is_empty()) else {
        return empty_object();
    };

    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Request body is not JSON ({}), forwarding {{}}", e);
            empty_object()
        }
    }
}

/// Apply `policy` to an already parsed body. Values of kept fields are
/// never touched, explicit `null`s included.
pub fn apply_policy(value: Value, policy: PayloadPolicy) -> Value {
    match (policy, value) {
        (PayloadPolicy::Passthrough, value) => value,
        (PayloadPolicy::Strict, Value::Object(mut fields)) => {
            fields.retain(|key, _| RECOGNIZED_FIELDS.contains(&key.as_str()));
            Value::Object(fields)
        }
        (PayloadPolicy::Strict, _) => empty_object(),
    }
}

/// Parse and filter a raw body in one step.
pub fn normalize(body: Option<&[u8]>, policy: PayloadPolicy) -> Value {
    apply_policy(parse_body(body), policy)
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
