//! Inbound request type handed to the relay.

use bytes::Bytes;
use std::collections::HashMap;

/// HTTP method of an inbound request.
///
/// Only `Post` and `Options` are served; everything else is kept around
/// so it can be named in logs and rejected with 405.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Other(String),
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
            Method::Patch => write!(f, "PATCH"),
            Method::Head => write!(f, "HEAD"),
            Method::Options => write!(f, "OPTIONS"),
            Method::Other(name) => write!(f, "{}", name),
        }
    }
}

impl From<&hyper::Method> for Method {
    fn from(method: &hyper::Method) -> Self {
        match *method {
            hyper::Method::GET => Method::Get,
            hyper::Method::POST => Method::Post,
            hyper::Method::PUT => Method::Put,
            hyper::Method::DELETE => Method::Delete,
            hyper::Method::PATCH => Method::Patch,
            hyper::Method::HEAD => Method::Head,
            hyper::Method::OPTIONS => Method::Options,
            _ => Method::Other(method.as_str().to_string()),
        }
    }
}

/// A fully buffered inbound request.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path, kept for logging only.
    pub path: String,
    /// HTTP headers, names lower-cased.
    pub headers: HashMap<String, String>,
    /// Raw request body.
    pub body: Option<Bytes>,
}

impl RelayRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Add a header. The name is stored lower-cased.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get a header value, case-insensitively.
    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers.get(&key.to_ascii_lowercase())
    }
}

impl Default for RelayRequest {
    fn default() -> Self {
        Self::new(Method::Get, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_method_keeps_its_name() {
        let method = Method::from(&hyper::Method::from_bytes(b"PROPFIND").unwrap());
        assert_eq!(method, Method::Other("PROPFIND".to_string()));
        assert_eq!(method.to_string(), "PROPFIND");
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = RelayRequest::new(Method::Post, "/api/ask")
            .header("Content-Type", "application/json");
        assert_eq!(
            request.get_header("content-type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(
            request.get_header("CONTENT-TYPE"),
            Some(&"application/json".to_string())
        );
    }
}
