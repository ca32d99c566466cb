//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → request spans from tower-http's TraceLayer (request ID, method, URI)
//!
//! Consumers:
//!     → logging.rs subscriber → stdout (JSON or human-readable)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Console logging only; no metrics endpoint

pub mod logging;
