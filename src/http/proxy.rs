//! HTTP forwarding.
//!
//! The fallback handler: every request not claimed by a fixed route lands
//! here, is matched against the routing table and forwarded to the rule's
//! upstream. Failures come back as `ProxyError` and are translated once, in
//! [`proxy_handler`].

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    response::{IntoResponse, Response},
};

use crate::http::error::ProxyError;
use crate::http::request::{forward_headers, request_id};
use crate::http::response::from_upstream;
use crate::http::server::AppState;
use crate::http::websocket;
use crate::routing::ProxyRule;

/// Main proxy handler.
/// Looks up the route and forwards the request, or tunnels a WebSocket.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let request_id = request_id(request.headers()).to_owned();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let Some(rule) = state.router.match_path(&path) else {
        tracing::debug!(request_id = %request_id, path = %path, "No route matched");
        return ProxyError::NoRoute(path).into_response();
    };

    let result = if rule.websocket && websocket::is_upgrade_request(request.headers()) {
        websocket::proxy_upgrade(&state, rule, request, &request_id).await
    } else {
        forward(&state, rule, request, &request_id).await
    };

    match result {
        Ok(response) => response,
        Err(error) => {
            tracing::error!(
                request_id = %request_id,
                peer = %peer,
                route = %rule.name,
                method = %method,
                path = %path,
                kind = error.kind(),
                error = %error,
                "Proxy error"
            );
            error.into_response()
        }
    }
}

/// Forward a plain HTTP request and stream the upstream response back.
async fn forward(
    state: &AppState,
    rule: &ProxyRule,
    request: Request,
    request_id: &str,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let url = rule.upstream_url(&parts.uri);

    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(ProxyError::RequestBody)?;

    tracing::debug!(
        request_id = %request_id,
        route = %rule.name,
        method = %parts.method,
        upstream = %url,
        body_bytes = body.len(),
        "Proxying request"
    );

    // GET and HEAD go out bodiless; everything else carries its (possibly
    // empty) body so the upstream sees a Content-Length.
    let bodiless = body.is_empty() && matches!(parts.method, Method::GET | Method::HEAD);
    let mut upstream = state
        .client
        .request(parts.method, url)
        .headers(forward_headers(&parts.headers));
    if !bodiless {
        upstream = upstream.body(body);
    }

    let response = upstream.send().await?;

    tracing::debug!(
        request_id = %request_id,
        route = %rule.name,
        status = %response.status(),
        "Upstream responded"
    );

    Ok(from_upstream(response))
}
