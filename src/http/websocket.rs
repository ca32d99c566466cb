//! WebSocket proxy handling.
//!
//! # Responsibilities
//! - Detect WebSocket upgrade requests
//! - Establish WebSocket connection to backend before accepting the client
//! - Complete upgrade handshake with client
//! - Bidirectional frame forwarding
//!
//! # Data Flow
//! ```text
//! Client ←──── WebSocket frames ────→ Proxy ←──── WebSocket frames ────→ Backend
//! ```
//!
//! # Design Decisions
//! - WebSocket handled separately from HTTP request/response
//! - Upstream connects first so an unreachable upstream yields a 500
//!   instead of an upgraded connection that closes immediately
//! - Frame-level forwarding (no message buffering)
//! - Close frames propagated in both directions; the tunnel stays up until
//!   the close reply has been relayed back, so both handshakes end cleanly
//! - Ping/pong handled transparently per hop

use std::time::Duration;

use axum::{
    extract::{
        ws::{self, Message, WebSocket, WebSocketUpgrade},
        FromRequestParts, Request,
    },
    http::{header, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self,
        client::IntoClientRequest,
        protocol::{frame::coding::CloseCode, CloseFrame},
    },
    MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::http::error::ProxyError;
use crate::http::response::strip_hop_by_hop;
use crate::http::server::AppState;
use crate::routing::ProxyRule;

type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a forwarded close waits for the peer's reply.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Handshake headers generated per hop and never copied across.
static HANDSHAKE_HEADERS: [HeaderName; 4] = [
    header::HOST,
    header::SEC_WEBSOCKET_KEY,
    header::SEC_WEBSOCKET_VERSION,
    header::SEC_WEBSOCKET_EXTENSIONS,
];

/// Returns true for `Upgrade: websocket` requests.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false)
}

/// Map an upstream `http(s)` URL to `ws(s)`.
pub fn websocket_url(mut url: Url) -> Result<Url, ProxyError> {
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        _ => return Err(ProxyError::WebSocketUrl(url.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| ProxyError::WebSocketUrl(url.to_string()))?;
    Ok(url)
}

/// Open the upstream socket, then upgrade the client and tunnel frames.
pub async fn proxy_upgrade(
    state: &AppState,
    rule: &ProxyRule,
    request: Request,
    request_id: &str,
) -> Result<Response, ProxyError> {
    let (mut parts, _body) = request.into_parts();
    let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, state).await {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let url = websocket_url(rule.upstream_url(&parts.uri))?;
    let handshake = handshake_request(&url, &parts.headers)?;

    let (upstream, upstream_response) =
        timeout(state.connect_timeout, connect_async(handshake))
            .await
            .map_err(|_| ProxyError::Timeout(state.connect_timeout))??;

    let protocol = upstream_response
        .headers()
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let upgrade = match protocol {
        Some(protocol) => upgrade.protocols([protocol]),
        None => upgrade,
    };

    tracing::info!(
        request_id = %request_id,
        route = %rule.name,
        upstream = %url,
        "WebSocket tunnel established"
    );

    let failed_id = request_id.to_owned();
    let request_id = request_id.to_owned();
    Ok(upgrade
        .on_failed_upgrade(move |error| {
            tracing::warn!(request_id = %failed_id, error = %error, "Client upgrade failed");
        })
        .on_upgrade(move |client| relay(client, upstream, request_id)))
}

fn handshake_request(
    url: &Url,
    headers: &HeaderMap,
) -> Result<tungstenite::handshake::client::Request, ProxyError> {
    let mut request = url.as_str().into_client_request()?;
    for (name, value) in strip_hop_by_hop(headers).iter() {
        if HANDSHAKE_HEADERS.contains(name) {
            continue;
        }
        request.headers_mut().append(name.clone(), value.clone());
    }
    Ok(request)
}

/// Pump frames until both sides have closed, or one side drops.
///
/// A close frame from either peer is forwarded and the other direction
/// stays open until the matching close reply comes back, so both close
/// handshakes complete. The wait for that reply is bounded by
/// [`CLOSE_GRACE`].
async fn relay(client: WebSocket, upstream: UpstreamSocket, request_id: String) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let mut client_closed = false;
    let mut upstream_closed = false;
    let mut deadline: Option<Instant> = None;

    while !(client_closed && upstream_closed) {
        let grace = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            message = client_rx.next(), if !client_closed => {
                let Some(Ok(message)) = message else {
                    tracing::debug!(request_id = %request_id, "Client side of tunnel dropped");
                    break;
                };
                let Some(message) = to_upstream(message) else {
                    continue;
                };
                let closing = message.is_close();
                if upstream_tx.send(message).await.is_err() {
                    break;
                }
                client_closed = closing;
            }
            message = upstream_rx.next(), if !upstream_closed => {
                let Some(Ok(message)) = message else {
                    tracing::debug!(request_id = %request_id, "Upstream side of tunnel dropped");
                    break;
                };
                let Some(message) = to_client(message) else {
                    continue;
                };
                let closing = matches!(message, Message::Close(_));
                if client_tx.send(message).await.is_err() {
                    break;
                }
                upstream_closed = closing;
            }
            _ = grace => {
                tracing::debug!(request_id = %request_id, "Close reply not received in time");
                break;
            }
        }

        if deadline.is_none() && (client_closed || upstream_closed) {
            deadline = Some(Instant::now() + CLOSE_GRACE);
        }
    }

    // Flushes pending close replies, or starts the close on the side that
    // is still open.
    let _ = timeout(CLOSE_GRACE, async {
        let _ = upstream_tx.close().await;
        let _ = client_tx.close().await;
    })
    .await;

    tracing::info!(request_id = %request_id, "WebSocket tunnel closed");
}

fn to_upstream(message: Message) -> Option<tungstenite::Message> {
    match message {
        Message::Text(text) => Some(tungstenite::Message::Text(text.as_str().into())),
        Message::Binary(data) => Some(tungstenite::Message::Binary(data)),
        Message::Close(frame) => Some(tungstenite::Message::Close(frame.map(|f| CloseFrame {
            code: CloseCode::from(f.code),
            reason: f.reason.as_str().into(),
        }))),
        Message::Ping(_) | Message::Pong(_) => None,
    }
}

fn to_client(message: tungstenite::Message) -> Option<Message> {
    match message {
        tungstenite::Message::Text(text) => Some(Message::Text(text.as_str().into())),
        tungstenite::Message::Binary(data) => Some(Message::Binary(data)),
        tungstenite::Message::Close(frame) => Some(Message::Close(frame.map(|f| ws::CloseFrame {
            code: f.code.into(),
            reason: f.reason.as_str().into(),
        }))),
        tungstenite::Message::Ping(_)
        | tungstenite::Message::Pong(_)
        | tungstenite::Message::Frame(_) => None,
    }
}
