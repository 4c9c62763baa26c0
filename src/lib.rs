//! # inference-relay
//!
//! A small HTTP relay that lets browser pages call a machine-learning
//! inference endpoint directly. It accepts a POST, attaches the bearer
//! credential the browser must never see, forwards the body to the
//! configured upstream, and returns the upstream's answer with CORS headers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  POST / OPTIONS   ┌─────────────────────────────────┐
//! │   Browser    │ ────────────────▶ │          RelayServer            │
//! │   client     │ ◀──────────────── │  (hyper, any path)              │
//! └──────────────┘  reply + CORS     │  ┌───────────────────────────┐  │
//!                                    │  │       RelayHandler        │  │
//!                                    │  │ method gate → config →    │  │
//!                                    │  │ payload → upstream →      │  │
//!                                    │  │ translate → CORS          │  │
//!                                    │  └─────────────┬─────────────┘  │
//!                                    └────────────────┼────────────────┘
//!                                                     │ POST + Bearer
//!                                                     ▼
//!                                    ┌─────────────────────────────────┐
//!                                    │   Upstream inference endpoint   │
//!                                    └─────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use inference_relay::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = RelayConfig::from_env()?;
//!     let handler = RelayHandler::new(config, Arc::new(HttpUpstream::new()?));
//!
//!     RelayServer::new(ServerConfig::from_env()?, handler).run().await
//! }
//! ```
//!
//! ## Replies
//!
//! | Situation | Status | Body |
//! |---|---|---|
//! | `OPTIONS` preflight | 200 | empty |
//! | any other non-POST method | 405 | `{"error":"Only POST allowed"}` |
//! | endpoint or key not configured | 500 | `{"error":"..."}` |
//! | upstream answered | upstream's | JSON or `text/plain` |
//! | network failure or timeout | 502 | `{"error":"Proxy error","message":"..."}` |
//!
//! Every reply, including errors, carries the CORS headers.

pub mod config;
pub mod cors;
pub mod error;
pub mod http;
pub mod payload;
pub mod relay;
pub mod runtime;
pub mod upstream;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::config::{RelayConfig, UpstreamTarget};
    pub use crate::cors::CorsPolicy;
    pub use crate::error::{ConfigError, RelayError};
    pub use crate::http::{Method, RelayRequest, RelayResponse, StatusCode};
    pub use crate::payload::PayloadPolicy;
    pub use crate::relay::RelayHandler;
    pub use crate::runtime::{RelayServer, ServerConfig};
    pub use crate::upstream::{HttpUpstream, Upstream, UpstreamReply};
    pub use async_trait::async_trait;
}

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::{RelayRequest, RelayResponse};
pub use relay::RelayHandler;
pub use runtime::{RelayServer, ServerConfig};
