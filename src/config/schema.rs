//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Production origin allowed to read proxied responses.
pub const PRODUCTION_ORIGIN: &str = "https://devlop.app";

/// Origin of the editor when served locally.
pub const DEVELOPMENT_ORIGIN: &str = "http://localhost:3099";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Deployment environment, selects the CORS origin.
    pub environment: Environment,

    /// CORS policy settings.
    pub cors: CorsConfig,

    /// Forwarding rules.
    pub routes: Vec<RouteConfig>,

    /// Upstream timeouts.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            environment: Environment::default(),
            cors: CorsConfig::default(),
            routes: RouteConfig::defaults(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// Listen port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    #[default]
    Development,
}

impl Environment {
    /// Interpret a `NODE_ENV` value. Only `production` selects production.
    pub fn from_node_env(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origin allowed in production.
    pub production_origin: String,

    /// Origin allowed everywhere else.
    pub development_origin: String,

    /// Methods advertised in `Access-Control-Allow-Methods`.
    pub allowed_methods: Vec<String>,

    /// Headers advertised in `Access-Control-Allow-Headers`.
    pub allowed_headers: Vec<String>,

    /// Whether browsers may send credentials.
    pub allow_credentials: bool,
}

impl CorsConfig {
    /// The single origin allowed for the given environment.
    pub fn origin_for(&self, environment: Environment) -> &str {
        match environment {
            Environment::Production => &self.production_origin,
            Environment::Development => &self.development_origin,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            production_origin: PRODUCTION_ORIGIN.to_string(),
            development_origin: DEVELOPMENT_ORIGIN.to_string(),
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: true,
        }
    }
}

/// A forwarding rule: requests under `path_prefix` go to `target`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Path prefix to match (segment boundary).
    pub path_prefix: String,

    /// Upstream origin, e.g. `https://snack.expo.dev`.
    pub target: String,

    /// Remove the prefix before forwarding.
    #[serde(default = "default_true")]
    pub strip_prefix: bool,

    /// Tunnel WebSocket upgrades on this route.
    #[serde(default)]
    pub websocket: bool,
}

impl RouteConfig {
    /// The two built-in Snack routes.
    pub fn defaults() -> Vec<RouteConfig> {
        vec![
            RouteConfig {
                name: "snack".to_string(),
                path_prefix: "/snack".to_string(),
                target: "https://snack.expo.dev".to_string(),
                strip_prefix: true,
                websocket: true,
            },
            RouteConfig {
                name: "api".to_string(),
                path_prefix: "/api".to_string(),
                target: "https://api.snack.expo.dev".to_string(),
                strip_prefix: true,
                websocket: false,
            },
        ]
    }
}

fn default_true() -> bool {
    true
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_secs: 10 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest request body forwarded upstream, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON in production, human-readable otherwise.
    #[default]
    Auto,
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Auto,
        }
    }
}
