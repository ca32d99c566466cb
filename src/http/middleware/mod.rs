//! HTTP middleware.
//!
//! Order, outermost first: request ID → trace → CORS → error boundary →
//! handlers. CORS sits outside the boundary so generated 500s carry CORS
//! headers too.

pub mod cors;
pub mod error_boundary;

pub use cors::{cors_middleware, CorsPolicy};
