//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate route prefixes and upstream targets
//! - Reject CORS settings browsers would refuse
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::http::health::HEALTH_PATH;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no routes configured")]
    NoRoutes,

    #[error("route {route}: path prefix {prefix:?} must start with '/'")]
    RelativePrefix { route: String, prefix: String },

    #[error("route {route}: path prefix {prefix:?} is already used")]
    DuplicatePrefix { route: String, prefix: String },

    #[error("route {route}: path prefix {prefix:?} shadows the health check")]
    ShadowsHealth { route: String, prefix: String },

    #[error("route {route}: invalid target {target:?}: {reason}")]
    InvalidTarget {
        route: String,
        target: String,
        reason: String,
    },

    #[error("cors: origin {0:?} is not a valid header value")]
    InvalidOrigin(String),

    #[error("cors: wildcard origin cannot be combined with credentials")]
    WildcardWithCredentials,

    #[error("cors: invalid method {0:?}")]
    InvalidMethod(String),

    #[error("cors: invalid header name {0:?}")]
    InvalidHeader(String),

    #[error("timeouts.connect_secs must be greater than zero")]
    ZeroConnectTimeout,

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_routes(config, &mut errors);
    validate_cors(config, &mut errors);

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
        return;
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        let prefix = route.path_prefix.trim_end_matches('/');

        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::RelativePrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        } else if !seen.insert(prefix.to_string()) {
            errors.push(ValidationError::DuplicatePrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        }

        if prefix.is_empty() || HEALTH_PATH.starts_with(&format!("{prefix}/")) || prefix == HEALTH_PATH {
            errors.push(ValidationError::ShadowsHealth {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        }

        if let Err(reason) = check_target(&route.target) {
            errors.push(ValidationError::InvalidTarget {
                route: route.name.clone(),
                target: route.target.clone(),
                reason,
            });
        }
    }
}

fn check_target(target: &str) -> Result<(), String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}

fn validate_cors(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    let cors = &config.cors;

    for origin in [&cors.production_origin, &cors.development_origin] {
        if origin.trim().is_empty() || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        } else if origin == "*" && cors.allow_credentials {
            errors.push(ValidationError::WildcardWithCredentials);
        }
    }

    for method in &cors.allowed_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    for header in &cors.allowed_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeader(header.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(name: &str, prefix: &str, target: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            path_prefix: prefix.into(),
            target: target.into(),
            strip_prefix: true,
            websocket: false,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.routes = vec![
            route("a", "api", "https://example.com"),
            route("b", "/b", "ftp://example.com"),
            route("c", "/b/", "https://example.com"),
        ];
        config.timeouts.connect_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::RelativePrefix { .. }));
        assert!(matches!(errors[1], ValidationError::InvalidTarget { .. }));
        assert!(matches!(errors[2], ValidationError::DuplicatePrefix { .. }));
        assert_eq!(errors[3], ValidationError::ZeroConnectTimeout);
    }

    #[test]
    fn health_path_is_reserved() {
        let mut config = ProxyConfig::default();
        config.routes = vec![route("h", "/health", "https://example.com")];
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::ShadowsHealth { .. }));

        config.routes = vec![route("root", "/", "https://example.com")];
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::ShadowsHealth { .. }));
    }

    #[test]
    fn wildcard_origin_with_credentials() {
        let mut config = ProxyConfig::default();
        config.cors.development_origin = "*".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::WildcardWithCredentials]);

        config.cors.allow_credentials = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn bad_method_and_header() {
        let mut config = ProxyConfig::default();
        config.cors.allowed_methods.push("GE T".into());
        config.cors.allowed_headers.push("Bad Header".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidMethod("GE T".into()),
                ValidationError::InvalidHeader("Bad Header".into()),
            ]
        );
    }

    #[test]
    fn target_with_base_path_is_allowed() {
        let mut config = ProxyConfig::default();
        config.routes = vec![route("api", "/api", "https://example.com/v2")];
        assert!(validate_config(&config).is_ok());
    }
}
