//! OS signal handling.
//!
//! The first Ctrl-C (SIGINT) triggers [`Shutdown`]; loops watching it close
//! their subscriptions and return, and the top-level command is abandoned.
//! Once the listener is installed the process keeps SIGINT captured, so a
//! second Ctrl-C exits immediately with [`INTERRUPTED_EXIT_CODE`].

use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;

/// Exit status after an interrupt (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Spawn the Ctrl-C listener.
pub fn spawn_ctrl_c(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Could not install Ctrl-C handler");
            return;
        }
        tracing::info!("Interrupt received, shutting down");
        shutdown.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt, exiting now");
            std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
        }
    })
}
