//! Bounded polling for open-ended confirmations.
//!
//! Each attempt sleeps the interval and then queries once. The loop stops on
//! the first terminal status, when the attempt cap is reached, or when a
//! shutdown signal arrives.

use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::TimingConfig;
use crate::lifecycle::wait_for_shutdown;
use crate::observability::metrics;

/// What one query saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    Done(T),
    /// The remote service reported an explicit failure.
    Failed(String),
    /// Not finished; carries the raw status string if there was one.
    Pending(Option<String>),
}

/// How the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Completed { value: T, attempts: u32 },
    Failed { reason: String, attempts: u32 },
    /// Cap reached without a terminal status. Not an error.
    Exhausted { attempts: u32, last_status: Option<String> },
    Interrupted { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Completed { attempts, .. }
            | PollOutcome::Failed { attempts, .. }
            | PollOutcome::Exhausted { attempts, .. }
            | PollOutcome::Interrupted { attempts } => *attempts,
        }
    }
}

/// Fixed-cap, fixed-interval poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedPoll {
    max_attempts: u32,
    interval: Duration,
}

impl BoundedPoll {
    /// A cap of zero is raised to one.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.poll_max_attempts, timing.poll_interval())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Poll until done, failed or exhausted.
    ///
    /// `query` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, query: F) -> PollOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = PollStatus<T>>,
    {
        self.drive(query, None).await
    }

    /// Like [`run`](Self::run), but returns `Interrupted` as soon as
    /// `shutdown` fires. A closed channel never interrupts.
    pub async fn run_until<T, F, Fut>(&self, query: F, shutdown: &mut broadcast::Receiver<()>) -> PollOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = PollStatus<T>>,
    {
        self.drive(query, Some(shutdown)).await
    }

    async fn drive<T, F, Fut>(&self, mut query: F, mut shutdown: Option<&mut broadcast::Receiver<()>>) -> PollOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = PollStatus<T>>,
    {
        let mut last_status = None;

        for attempt in 1..=self.max_attempts {
            let interval = self.interval;
            let step = async {
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                query(attempt).await
            };

            let status = tokio::select! {
                biased;
                _ = wait_for_shutdown(shutdown.as_deref_mut()) => {
                    tracing::info!(attempt, "Poll interrupted");
                    return PollOutcome::Interrupted { attempts: attempt - 1 };
                }
                status = step => status,
            };

            match status {
                PollStatus::Done(value) => {
                    metrics::record_poll_attempt("done");
                    return PollOutcome::Completed { value, attempts: attempt };
                }
                PollStatus::Failed(reason) => {
                    metrics::record_poll_attempt("failed");
                    return PollOutcome::Failed { reason, attempts: attempt };
                }
                PollStatus::Pending(status) => {
                    metrics::record_poll_attempt("pending");
                    tracing::debug!(attempt, max = self.max_attempts, status = ?status, "Still pending");
                    if status.is_some() {
                        last_status = status;
                    }
                }
            }
        }

        PollOutcome::Exhausted {
            attempts: self.max_attempts,
            last_status,
        }
    }
}
