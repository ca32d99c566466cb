//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use snack_proxy::config::{ProxyConfig, RouteConfig};
use snack_proxy::{HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;

/// A request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub type RequestLog = Arc<Mutex<Vec<RecordedRequest>>>;

/// Proxy config with both routes pointed at local addresses.
pub fn test_config(snack: SocketAddr, api: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.timeouts.connect_secs = 2;
    config.routes = vec![
        RouteConfig {
            name: "snack".into(),
            path_prefix: "/snack".into(),
            target: format!("http://{snack}"),
            strip_prefix: true,
            websocket: true,
        },
        RouteConfig {
            name: "api".into(),
            path_prefix: "/api".into(),
            target: format!("http://{api}"),
            strip_prefix: true,
            websocket: false,
        },
    ];
    config
}

/// Start the proxy on an ephemeral port.
pub async fn spawn_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    spawn_server(HttpServer::new(config).unwrap()).await
}

/// Start an already-built server on an ephemeral port.
pub async fn spawn_server(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that ignores any proxy settings in the environment.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start a mock upstream that records every request and answers 200 with
/// `"<METHOD> <target>"` as body. It also sends a wildcard CORS header the
/// proxy is expected to replace.
pub async fn start_recording_backend() -> (SocketAddr, RequestLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));

    let requests = log.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let body = format!("{} {}", request.method, request.target);
                        requests.lock().unwrap().push(request);

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nAccess-Control-Allow-Origin: *\r\nX-Upstream: recorded\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, log)
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method,
        target,
        headers,
        body,
    })
}

/// What a WebSocket upstream observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsEvent {
    Connected { path: String },
    /// The close handshake completed.
    Closed,
    /// The connection ended without a completed close handshake.
    Reset,
}

/// Start a WebSocket upstream that echoes text and binary frames back and
/// selects the first requested subprotocol.
pub async fn start_echo_ws_backend() -> (SocketAddr, mpsc::UnboundedReceiver<WsEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let events = events_tx.clone();
            tokio::spawn(async move {
                let handshake_events = events.clone();
                let callback = move |request: &Request,
                                     mut response: Response|
                      -> Result<Response, ErrorResponse> {
                    let _ = handshake_events.send(WsEvent::Connected {
                        path: request.uri().path().to_string(),
                    });
                    let first = request
                        .headers()
                        .get("sec-websocket-protocol")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.split(',').next())
                        .map(|v| v.trim().to_string());
                    if let Some(protocol) = first {
                        if let Ok(value) = HeaderValue::from_str(&protocol) {
                            response.headers_mut().insert("sec-websocket-protocol", value);
                        }
                    }
                    Ok(response)
                };

                let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(socket, callback).await else {
                    return;
                };

                loop {
                    match ws.next().await {
                        Some(Ok(message)) if message.is_text() || message.is_binary() => {
                            if ws.send(message).await.is_err() {
                                let _ = events.send(WsEvent::Reset);
                                return;
                            }
                        }
                        // Reading on after a close flushes the reply.
                        Some(Ok(_)) => {}
                        None => {
                            let _ = events.send(WsEvent::Closed);
                            return;
                        }
                        Some(Err(_)) => {
                            let _ = events.send(WsEvent::Reset);
                            return;
                        }
                    }
                }
            });
        }
    });

    (addr, events_rx)
}

/// Start a WebSocket upstream that echoes the first text or binary frame,
/// then closes the connection itself.
pub async fn start_closing_ws_backend() -> (SocketAddr, mpsc::UnboundedReceiver<WsEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let events = events_tx.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };

                while let Some(Ok(message)) = ws.next().await {
                    if message.is_text() || message.is_binary() {
                        let _ = ws.send(message).await;
                        break;
                    }
                }

                if ws.close(None).await.is_err() {
                    let _ = events.send(WsEvent::Reset);
                    return;
                }
                loop {
                    match ws.next().await {
                        Some(Ok(_)) => {}
                        None => {
                            let _ = events.send(WsEvent::Closed);
                            return;
                        }
                        Some(Err(_)) => {
                            let _ = events.send(WsEvent::Reset);
                            return;
                        }
                    }
                }
            });
        }
    });

    (addr, events_rx)
}
