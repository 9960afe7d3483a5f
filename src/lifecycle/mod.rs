//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Validate → Init logging → run one command
//!
//! Signals (signals.rs):
//!     SIGINT → Shutdown::trigger; a second SIGINT exits with 130
//!
//! Shutdown (shutdown.rs):
//!     broadcast → poll loops / message streams return, subscriptions close
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{run_until_shutdown, wait_for_shutdown, Shutdown};
pub use signals::INTERRUPTED_EXIT_CODE;
