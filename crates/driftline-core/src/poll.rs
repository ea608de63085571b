//! Read-after-write polling for an eventually consistent document.
//!
//! A successful patch is not guaranteed to show up on the next read. The
//! poller is the only component allowed to retry: it re-runs a check with a
//! fixed delay until the check passes, fails, or the attempt budget runs out.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{ReconcileError, ReconcileResult};

/// Attempts allowed when confirming a write.
pub const WRITE_ATTEMPTS: u32 = 10;
/// Attempts allowed when a plain read finds no document yet.
pub const READ_ATTEMPTS: u32 = 5;
/// Fixed delay between attempts.
pub const POLL_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl PollPolicy {
    pub const fn write() -> Self {
        Self {
            max_attempts: WRITE_ATTEMPTS,
            delay: POLL_DELAY,
        }
    }

    pub const fn read() -> Self {
        Self {
            max_attempts: READ_ATTEMPTS,
            delay: POLL_DELAY,
        }
    }

    /// Total sleep when every attempt fails.
    pub fn budget(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::write()
    }
}

/// Blocks the calling thread between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Caller-held cancellation signal with an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Outcome of a converged poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub attempts: u32,
    pub waited: Duration,
}

pub struct Poller {
    policy: PollPolicy,
    sleeper: Box<dyn Sleeper>,
    cancellation: Cancellation,
}

impl fmt::Debug for Poller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("policy", &self.policy)
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(PollPolicy::write())
    }
}

impl Poller {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            sleeper: Box::new(ThreadSleeper),
            cancellation: Cancellation::new(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Same sleeper and cancellation, different attempt budget.
    pub fn wait_for_with<F>(&self, policy: PollPolicy, mut check: F) -> ReconcileResult<PollReport>
    where
        F: FnMut() -> ReconcileResult<bool>,
    {
        let mut waited = Duration::ZERO;
        for attempt in 1..=policy.max_attempts {
            if check()? {
                tracing::debug!(attempt, ?waited, "Remote document converged");
                return Ok(PollReport {
                    attempts: attempt,
                    waited,
                });
            }
            if attempt == policy.max_attempts {
                break;
            }
            if attempt > 1 {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    "Remote document has not converged yet"
                );
            }
            if self.cancellation.is_cancelled() {
                return Err(ReconcileError::Cancelled { attempts: attempt });
            }
            self.sleeper.sleep(policy.delay);
            waited += policy.delay;
        }
        Err(ReconcileError::ConsistencyTimeout {
            attempts: policy.max_attempts,
            waited,
        })
    }

    /// Run `check` until it returns `Ok(true)`.
    ///
    /// `Ok(false)` means not yet converged; an error aborts immediately.
    pub fn wait_for<F>(&self, check: F) -> ReconcileResult<PollReport>
    where
        F: FnMut() -> ReconcileResult<bool>,
    {
        self.wait_for_with(self.policy, check)
    }
}
