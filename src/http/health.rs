//! Liveness endpoint. Reports only that the proxy process is up; upstreams
//! are never contacted.

pub const HEALTH_PATH: &str = "/health";
pub const HEALTH_BODY: &str = "Proxy server is running";

pub async fn health() -> &'static str {
    HEALTH_BODY
}
