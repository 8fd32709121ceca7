//! Bounded retry policy for the write protocol.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use innledger_error::{LedgerError, Result};

/// How many times a failed write is attempted and how long to pause between
/// attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Base pause handed to the [`Backoff`] between attempts.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 100,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(LedgerError::config("retry.max_attempts must be >= 1"));
        }
        Ok(())
    }

    #[must_use]
    pub fn base_pause(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Pause strategy between write attempts.
///
/// The vault holds this behind a trait object so tests drive the full retry
/// loop without real sleeps.
pub trait Backoff: Send + Sync {
    /// Pause after attempt number `attempt` (1-based) failed.
    fn pause(&self, attempt: u32, base: Duration);
}

/// Production backoff: sleep the base pause, scaled by the attempt number.
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepBackoff;

impl Backoff for SleepBackoff {
    fn pause(&self, attempt: u32, base: Duration) {
        std::thread::sleep(base.saturating_mul(attempt));
    }
}

/// Test backoff: never sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    fn pause(&self, _attempt: u32, _base: Duration) {}
}
