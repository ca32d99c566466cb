//! Proxy failures and their translation into HTTP responses.
//!
//! Every forwarding attempt returns `Result<Response, ProxyError>`; the
//! handler logs the error with request context and converts it here. No
//! variant is fatal to the process.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Body returned for any failed forwarding attempt.
pub const PROXY_ERROR_BODY: &str = "Proxy Error";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no route matches {0}")]
    NoRoute(String),

    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("websocket upstream failed: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("upstream connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("cannot derive websocket url from {0}")]
    WebSocketUrl(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoRoute(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short classification for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::NoRoute(_) => "no_route",
            ProxyError::RequestBody(_) => "request_body",
            ProxyError::Upstream(e) if e.is_timeout() => "timeout",
            ProxyError::Upstream(e) if e.is_connect() => "connect",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::WebSocket(_) => "websocket",
            ProxyError::Timeout(_) => "timeout",
            ProxyError::WebSocketUrl(_) => "websocket_url",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self.status() {
            StatusCode::NOT_FOUND => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            status => (status, PROXY_ERROR_BODY).into_response(),
        }
    }
}
