//! Route lookup and upstream URL construction.
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest prefix wins; rules are sorted once at startup
//! - Explicit `None` rather than a silent default route

use axum::http::Uri;
use thiserror::Error;
use url::Url;

use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefixMatcher;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route {route}: invalid target {target:?}: {source}")]
    InvalidTarget {
        route: String,
        target: String,
        #[source]
        source: url::ParseError,
    },
}

/// A compiled forwarding rule.
#[derive(Debug, Clone)]
pub struct ProxyRule {
    pub name: String,
    pub matcher: PathPrefixMatcher,
    pub target: Url,
    pub strip_prefix: bool,
    pub websocket: bool,
}

impl ProxyRule {
    pub fn from_config(config: &RouteConfig) -> Result<Self, RouteError> {
        let target = Url::parse(&config.target).map_err(|source| RouteError::InvalidTarget {
            route: config.name.clone(),
            target: config.target.clone(),
            source,
        })?;

        Ok(Self {
            name: config.name.clone(),
            matcher: PathPrefixMatcher::new(config.path_prefix.clone()),
            target,
            strip_prefix: config.strip_prefix,
            websocket: config.websocket,
        })
    }

    /// Path to request upstream for an inbound `path` matched by this rule.
    pub fn rewrite_path(&self, path: &str) -> String {
        if !self.strip_prefix {
            return path.to_string();
        }
        match self.matcher.remainder(path) {
            Some("") | None => "/".to_string(),
            Some(rest) => rest.to_string(),
        }
    }

    /// Full upstream URL for an inbound request URI, query included.
    pub fn upstream_url(&self, uri: &Uri) -> Url {
        let rewritten = self.rewrite_path(uri.path());
        let base = self.target.path().trim_end_matches('/');

        let mut url = self.target.clone();
        url.set_path(&format!("{base}{rewritten}"));
        url.set_query(uri.query());
        url
    }
}

/// Immutable routing table.
#[derive(Debug, Clone, Default)]
pub struct ProxyRouter {
    rules: Vec<ProxyRule>,
}

impl ProxyRouter {
    /// Compile routes, ordered so the longest prefix is checked first.
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut rules = routes
            .iter()
            .map(ProxyRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        rules.sort_by(|a, b| b.matcher.prefix().len().cmp(&a.matcher.prefix().len()));
        Ok(Self { rules })
    }

    /// Find the rule for `path`, if any.
    pub fn match_path(&self, path: &str) -> Option<&ProxyRule> {
        self.rules.iter().find(|rule| rule.matcher.matches(path))
    }

    pub fn rules(&self) -> &[ProxyRule] {
        &self.rules
    }
}
