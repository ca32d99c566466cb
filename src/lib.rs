//! Snack reverse proxy library.
//!
//! Forwards `/snack/*` and `/api/*` to the Snack services with the prefix
//! stripped, tunnels WebSocket upgrades on `/snack`, answers `/health`
//! locally and stamps a single-origin CORS policy on every response.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
