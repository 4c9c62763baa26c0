//! HTTP server hosting the relay handler.

use crate::error::RelayError;
use crate::http::{Method, RelayRequest, RelayResponse};
use crate::relay::RelayHandler;
use crate::runtime::ServerConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn, Instrument};

/// HTTP/1 server that routes every request, whatever its path, to a single
/// [`RelayHandler`].
pub struct RelayServer {
    config: ServerConfig,
    handler: Arc<RelayHandler>,
}

impl RelayServer {
    pub fn new(config: ServerConfig, handler: RelayHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Bind to the configured address and serve forever.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Relay listening on {}", listener.local_addr()?);

        let handler = self.handler.clone();
        let config = self.config.clone();

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let handler = handler.clone();
            let config = config.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    let config = config.clone();
                    async move { handle_request(req, handler, config, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Handle an incoming HTTP request.
async fn handle_request(
    req: Request<Incoming>,
    handler: Arc<RelayHandler>,
    config: ServerConfig,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let request_id = generate_request_id();
    let span = tracing::info_span!("relay", request_id = %request_id);
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    async move {
        debug!("Handling request: {} {} from {}", method, path, remote_addr);

        let response = match convert_request(req, &config).await {
            Ok(relay_request) => handler.handle(relay_request).await,
            Err(e) => handler.error_response(e),
        };

        info!("{} {} -> {}", method, path, response.status.0);
        Ok(build_response(response))
    }
    .instrument(span)
    .await
}

/// Convert a hyper Request to a RelayRequest. Only POST bodies are read,
/// and only up to the configured limit.
async fn convert_request(
    req: Request<Incoming>,
    config: &ServerConfig,
) -> Result<RelayRequest, RelayError> {
    let method = Method::from(req.method());
    let path = req.uri().path().to_string();

    let mut headers = HashMap::new();
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_string(), v.to_string());
        }
    }

    let body = if method == Method::Post {
        read_body(req.into_body(), config.max_body_size).await?
    } else {
        None
    };

    Ok(RelayRequest {
        method,
        path,
        headers,
        body,
    })
}

async fn read_body(body: Incoming, limit: usize) -> Result<Option<Bytes>, RelayError> {
    let bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                RelayError::BodyTooLarge
            } else {
                RelayError::BodyRead(e.to_string())
            }
        })?
        .to_bytes();

    Ok((!bytes.is_empty()).then_some(bytes))
}

/// Build a hyper Response from a RelayResponse.
fn build_response(relay_response: RelayResponse) -> Response<Full<Bytes>> {
    let status = hyper::StatusCode::from_u16(relay_response.status.0).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 502 Bad Gateway",
            relay_response.status.0
        );
        hyper::StatusCode::BAD_GATEWAY
    });

    let mut builder = Response::builder().status(status);
    for (name, value) in relay_response.headers {
        builder = builder.header(name, value);
    }

    let body = relay_response.body.unwrap_or_default();
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        error!("Failed to build response: {}", e);
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

/// Generate a request ID for log correlation.
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{:x}", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;

    #[test]
    fn test_build_response_copies_status_and_headers() {
        let response = build_response(
            RelayResponse::text(StatusCode::SERVICE_UNAVAILABLE, "overloaded")
                .header("Access-Control-Allow-Origin", "*"),
        );
        assert_eq!(response.status(), hyper::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[test]
    fn test_build_response_rejects_invalid_status() {
        let response = build_response(RelayResponse::new(StatusCode(42)));
        assert_eq!(response.status(), hyper::StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_request_ids_are_hex() {
        let id = generate_request_id();
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
