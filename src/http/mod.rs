//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/ (request ID, CORS, error boundary)
//!     → health.rs                          for GET /health
//!     → proxy.rs (route lookup, forward)   for everything else
//!         → websocket.rs                   for upgrades on WebSocket routes
//!         → response.rs (strip hop-by-hop, stream body)
//!     → Send to client
//! ```

pub mod error;
pub mod health;
pub mod middleware;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use error::ProxyError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
