//! Reconnect attempt accounting.
//!
//! The initial connect is not a retry. Every failure after it consumes one
//! attempt; once `max_attempts` retries have failed the tracker gives up and
//! never hands out another attempt until it is reset.

/// Outcome of asking for the next reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule reconnect number `attempt` (1-based).
    Retry { attempt: u32 },
    /// Attempts exhausted.
    GiveUp { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct RetryTracker {
    attempt: u32,
    max_attempts: u32,
}

impl RetryTracker {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
        }
    }

    /// Attempts consumed since the last successful connect.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Called after a failure.
    pub fn next(&mut self) -> RetryDecision {
        if self.attempt >= self.max_attempts {
            return RetryDecision::GiveUp {
                attempts: self.attempt,
            };
        }
        self.attempt += 1;
        RetryDecision::Retry {
            attempt: self.attempt,
        }
    }

    /// Called after a successful connect.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
