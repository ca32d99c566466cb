//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (--config / SNACK_PROXY_CONFIG)
//!     → loader.rs (read & deserialize, or built-in defaults)
//!     → env.rs (PORT, NODE_ENV overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to HttpServer::new, never read from the environment again
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults so the proxy runs without a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::EnvOverrides;
pub use loader::{load_config, ConfigError};
pub use schema::{
    CorsConfig, Environment, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProxyConfig, RouteConfig, TimeoutConfig,
};
