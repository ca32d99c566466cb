//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health route and the proxy fallback
//! - Wire up middleware (request ID, tracing, CORS, error boundary)
//! - Build the upstream HTTP client
//! - Serve on a listener until shutdown is signalled

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    middleware,
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::health::{health, HEALTH_PATH};
use crate::http::middleware::{cors_middleware, error_boundary, CorsPolicy};
use crate::http::proxy::proxy_handler;
use crate::http::request::{request_id, UuidRequestId};
use crate::routing::{ProxyRouter, RouteError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("invalid CORS header value: {0}")]
    Cors(#[from] axum::http::header::InvalidHeaderValue),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub client: reqwest::Client,
    pub connect_timeout: Duration,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &ProxyConfig) -> Result<Self, ServerError> {
        let connect_timeout = Duration::from_secs(config.timeouts.connect_secs);

        // Redirects go back to the browser untouched.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            router: Arc::new(ProxyRouter::from_config(&config.routes)?),
            client,
            connect_timeout,
            max_body_bytes: config.limits.max_body_bytes,
        })
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        Self::with_routes(config, Router::new())
    }

    /// Like [`HttpServer::new`], with extra routes mounted beside the
    /// health check and behind the same middleware.
    pub fn with_routes(config: ProxyConfig, extra: Router<AppState>) -> Result<Self, ServerError> {
        let state = AppState::new(&config)?;
        let cors = Arc::new(CorsPolicy::new(&config.cors, config.environment)?);

        for rule in state.router.rules() {
            tracing::debug!(
                route = %rule.name,
                prefix = %rule.matcher.prefix(),
                target = %rule.target,
                websocket = rule.websocket,
                "Route compiled"
            );
        }

        let router = Self::build_router(state, cors, extra);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, cors: Arc<CorsPolicy>, extra: Router<AppState>) -> Router {
        Router::new()
            // Other methods on /health fall through to the proxy and get its 404.
            .route(HEALTH_PATH, get(health).fallback(proxy_handler))
            .merge(extra)
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                        tracing::info_span!(
                            "request",
                            request_id = %request_id(request.headers()),
                            method = %request.method(),
                            uri = %request.uri(),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn_with_state(cors, cors_middleware))
                    .layer(error_boundary::layer()),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}
