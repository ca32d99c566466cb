//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Pick the log filter and output format
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Environment, LogFormat, ObservabilityConfig};

/// Default filter directive for a level.
pub fn default_directive(level: &str) -> String {
    format!("snack_proxy={level},tower_http={level}")
}

/// Resolve `auto` against the environment.
pub fn effective_format(format: LogFormat, environment: Environment) -> LogFormat {
    match format {
        LogFormat::Auto if environment.is_production() => LogFormat::Json,
        LogFormat::Auto => LogFormat::Pretty,
        explicit => explicit,
    }
}

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig, environment: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    match effective_format(config.log_format, environment) {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
