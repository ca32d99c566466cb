//! Environment variable overrides.
//!
//! The process environment is read exactly once, at startup, into
//! [`EnvOverrides`]. A `.env` file, when present, is merged into the
//! process environment first. Request handling never looks at either.

use std::path::PathBuf;

use crate::config::loader::ConfigError;
use crate::config::schema::{Environment, ProxyConfig};

pub const PORT: &str = "PORT";
pub const NODE_ENV: &str = "NODE_ENV";

/// Values captured from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub port: Option<String>,
    pub node_env: Option<String>,
}

impl EnvOverrides {
    /// Snapshot `PORT` and `NODE_ENV` from the current process.
    pub fn from_process_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Capture the overrides through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup(PORT),
            node_env: lookup(NODE_ENV),
        }
    }

    /// Apply the overrides on top of a file or default configuration.
    ///
    /// Empty values count as unset.
    pub fn apply(&self, config: &mut ProxyConfig) -> Result<(), ConfigError> {
        if let Some(port) = non_empty(&self.port) {
            config.listener.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: PORT,
                value: port.to_string(),
            })?;
        }

        if let Some(node_env) = non_empty(&self.node_env) {
            config.environment = Environment::from_node_env(node_env);
        }

        Ok(())
    }
}

/// Load `.env` from the working directory or one of its parents into the
/// process environment. Variables already set in the process win.
///
/// Returns the path of the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
