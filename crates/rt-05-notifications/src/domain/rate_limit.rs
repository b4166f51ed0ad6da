//! # Alert Rate Limiter
//!
//! Token bucket over intrusive deliveries. Time is passed in so the bucket
//! follows the injected clock.

use shared_types::Timestamp;

#[derive(Debug, Clone)]
pub struct AlertRateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    tokens: f64,
    last_refill: Option<Timestamp>,
}

impl AlertRateLimiter {
    /// `burst` tokens at most, `per_minute` tokens regained per minute.
    pub fn new(burst: u32, per_minute: u32) -> Self {
        Self {
            capacity: f64::from(burst),
            refill_per_sec: f64::from(per_minute) / 60.0,
            tokens: f64::from(burst),
            last_refill: None,
        }
    }

    /// Take one token if available.
    pub fn try_acquire(&mut self, now: Timestamp) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn available(&self) -> u32 {
        self.tokens.floor() as u32
    }

    fn refill(&mut self, now: Timestamp) {
        if let Some(last) = self.last_refill {
            let elapsed = (now - last).num_milliseconds().max(0) as f64 / 1000.0;
            self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        }
        if self.last_refill.map_or(true, |last| now > last) {
            self.last_refill = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_burst_then_refill() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut limiter = AlertRateLimiter::new(2, 60);

        assert!(limiter.try_acquire(start));
        assert!(limiter.try_acquire(start));
        assert!(!limiter.try_acquire(start));

        assert!(limiter.try_acquire(start + Duration::seconds(1)));
        assert!(!limiter.try_acquire(start + Duration::seconds(1)));
    }

    #[test]
    fn test_refill_capped_at_burst() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut limiter = AlertRateLimiter::new(2, 60);
        limiter.try_acquire(start);
        limiter.try_acquire(start + Duration::hours(1));
        assert_eq!(limiter.available(), 1);
    }
}
