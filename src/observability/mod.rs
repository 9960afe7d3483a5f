//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! publish / bridge / messaging flows
//!     → tracing events (logging.rs installs the stderr subscriber)
//!     → metrics counters (metrics.rs, `metrics` facade)
//! ```
//!
//! # Design Decisions
//! - Logs on stderr, presenter output on stdout
//! - No exporter is bundled; the facade is a no-op until a recorder exists
//! - Keys, seeds and API tokens never appear in events

pub mod logging;
pub mod metrics;
