//! Exponential backoff with uniform jitter.
//!
//! ```text
//! delay(n) = min(cap, base * 2^(n-1) + U[0, jitter])
//! ```
//!
//! With the defaults (base 1s, jitter 2s, cap 30s) the first reconnect waits
//! 1-3s.

use std::time::Duration;

use rand::Rng;

use crate::config::ConnectionOptions;

/// Largest exponent applied to the base delay.
const MAX_EXPONENT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub jitter: Duration,
    pub cap: Duration,
}

impl BackoffPolicy {
    pub fn from_options(options: &ConnectionOptions) -> Self {
        Self {
            base: options.backoff_base(),
            jitter: options.backoff_jitter(),
            cap: options.backoff_cap(),
        }
    }

    /// Delay before reconnect `attempt` (1-based) with an explicit jitter sample.
    pub fn delay(&self, attempt: u32, jitter: Duration) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_EXPONENT);
        let exponential = self.base.saturating_mul(1u32 << exponent);
        exponential.saturating_add(jitter.min(self.jitter)).min(self.cap)
    }

    /// Delay before reconnect `attempt` with jitter drawn from `rng`.
    pub fn delay_with<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let sample = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.gen_range(0..=jitter_ms))
        };
        self.delay(attempt, sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy::from_options(&ConnectionOptions::default())
    }

    #[test]
    fn test_first_attempt_without_jitter_is_base() {
        assert_eq!(policy().delay(1, Duration::ZERO), Duration::from_secs(1));
    }

    #[test]
    fn test_doubles_per_attempt() {
        let p = policy();
        assert_eq!(p.delay(2, Duration::ZERO), Duration::from_secs(2));
        assert_eq!(p.delay(4, Duration::ZERO), Duration::from_secs(8));
    }

    #[test]
    fn test_capped() {
        assert_eq!(policy().delay(10, Duration::ZERO), Duration::from_secs(30));
        assert_eq!(policy().delay(u32::MAX, Duration::ZERO), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_is_clamped_to_configured_bound() {
        assert_eq!(
            policy().delay(1, Duration::from_secs(60)),
            Duration::from_secs(3)
        );
    }

    proptest! {
        #[test]
        fn first_delay_between_one_and_three_seconds(seed in any::<u64>()) {
            use rand::SeedableRng;
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            let delay = policy().delay_with(1, &mut rng);
            prop_assert!(delay >= Duration::from_secs(1));
            prop_assert!(delay <= Duration::from_secs(3));
        }

        #[test]
        fn never_exceeds_cap(attempt in 1u32..64, jitter_ms in 0u64..5_000) {
            let delay = policy().delay(attempt, Duration::from_millis(jitter_ms));
            prop_assert!(delay <= Duration::from_secs(30));
        }
    }
}
