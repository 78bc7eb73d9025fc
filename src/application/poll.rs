//! Bounded fixed-interval polling.
//!
//! [`wait_until`] is the single readiness primitive behind pod, job and HTTP
//! health waits. It never fails: a timeout is an ordinary outcome and the
//! caller decides what it means.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::trace;

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The predicate returned true on attempt `attempts`.
    Ready { attempts: u32, elapsed: Duration },
    /// The predicate never returned true before the timeout.
    TimedOut { attempts: u32, elapsed: Duration },
}

impl Readiness {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready { .. })
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Readiness::Ready { attempts, .. } | Readiness::TimedOut { attempts, .. } => *attempts,
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        match self {
            Readiness::Ready { elapsed, .. } | Readiness::TimedOut { elapsed, .. } => *elapsed,
        }
    }
}

/// Poll `predicate` every `interval` until it returns true or `timeout` passes.
///
/// The predicate is checked first, then after each full `interval` sleep.
/// After a failed check the wait gives up once elapsed time has reached
/// `timeout`, so a zero timeout means exactly one attempt.
pub async fn wait_until<F, Fut>(mut predicate: F, interval: Duration, timeout: Duration) -> Readiness
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if predicate().await {
            return Readiness::Ready {
                attempts,
                elapsed: started.elapsed(),
            };
        }

        let elapsed = started.elapsed();
        if elapsed >= timeout {
            return Readiness::TimedOut { attempts, elapsed };
        }

        trace!(attempts, elapsed_ms = elapsed.as_millis() as u64, "Not ready, sleeping");
        sleep(interval).await;
    }
}
