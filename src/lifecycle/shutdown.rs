//! Shutdown coordination for long-running commands.

use std::future::Future;
use tokio::sync::broadcast;

/// Coordinator for interrupting polls and streams.
///
/// Provides a broadcast channel that every long-running loop subscribes to.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Subscribers created afterwards do not see it.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of loops still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve when the signal fires. With no receiver, or once every sender is
/// gone, this never resolves.
pub async fn wait_for_shutdown(shutdown: Option<&mut broadcast::Receiver<()>>) {
    match shutdown {
        Some(rx) => match rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}

/// Drive `work` unless shutdown fires first, in which case it is dropped
/// and `None` returned.
///
/// `work` is polled before the signal, so work that watches the same
/// signal still finishes its own interrupted path.
pub async fn run_until_shutdown<F: Future>(work: F, shutdown: &mut broadcast::Receiver<()>) -> Option<F::Output> {
    tokio::select! {
        biased;
        output = work => Some(output),
        _ = wait_for_shutdown(Some(shutdown)) => None,
    }
}
