//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (longest-prefix lookup)
//!     → matcher.rs (segment-boundary prefix test)
//!     → Return: matched ProxyRule or None
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Parse target URLs
//!     → Sort by prefix length
//!     → Freeze as immutable ProxyRouter
//! ```

pub mod matcher;
pub mod router;

pub use router::{ProxyRouter, ProxyRule, RouteError};
