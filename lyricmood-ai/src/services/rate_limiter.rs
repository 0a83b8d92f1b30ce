//! Sliding-window rate limiter
//!
//! Admits a request while fewer than `max_requests` timestamps fall inside the
//! trailing window. The limiter never sleeps: callers either fail fast with
//! [`RateLimiter::check`] or wait on [`RateLimiter::time_until_next_slot`].

use crate::error::{ExternalService, PipelineError, PipelineResult};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Sliding-window admission control for one external service
#[derive(Debug)]
pub struct RateLimiter {
    service: ExternalService,
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(service: ExternalService, max_requests: usize, window: Duration) -> Self {
        Self {
            service,
            max_requests,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether a request could be admitted now
    pub fn can_admit(&self) -> bool {
        self.can_admit_at(Instant::now())
    }

    pub fn can_admit_at(&self, now: Instant) -> bool {
        let mut timestamps = self.lock();
        self.prune(&mut timestamps, now);
        timestamps.len() < self.max_requests
    }

    /// Register one request at the current time
    pub fn record(&self) {
        self.record_at(Instant::now());
    }

    pub fn record_at(&self, now: Instant) {
        let mut timestamps = self.lock();
        self.prune(&mut timestamps, now);
        timestamps.push_back(now);
    }

    /// Time until the oldest timestamp leaves the window, zero if admissible
    pub fn time_until_next_slot(&self) -> Duration {
        self.time_until_next_slot_at(Instant::now())
    }

    pub fn time_until_next_slot_at(&self, now: Instant) -> Duration {
        let mut timestamps = self.lock();
        self.prune(&mut timestamps, now);

        if timestamps.len() < self.max_requests {
            return Duration::ZERO;
        }

        match timestamps.front() {
            Some(oldest) => self.window.saturating_sub(now.saturating_duration_since(*oldest)),
            None => Duration::ZERO,
        }
    }

    /// Admit and record one request, or fail with `RateLimited`
    ///
    /// Checking and recording happen under one lock so two callers cannot both
    /// take the last slot.
    pub fn check(&self, operation: &'static str) -> PipelineResult<()> {
        self.check_at(operation, Instant::now())
    }

    pub fn check_at(&self, operation: &'static str, now: Instant) -> PipelineResult<()> {
        let mut timestamps = self.lock();
        self.prune(&mut timestamps, now);

        if timestamps.len() < self.max_requests {
            timestamps.push_back(now);
            return Ok(());
        }

        let retry_after = timestamps
            .front()
            .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
            .unwrap_or(Duration::ZERO);

        tracing::warn!(
            service = %self.service,
            operation = operation,
            retry_after_ms = retry_after.as_millis() as u64,
            "Local rate limit reached"
        );

        Err(PipelineError::RateLimited {
            service: self.service,
            operation,
            retry_after,
        })
    }

    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = timestamps.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.timestamps.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(ExternalService::Catalog, 3, Duration::from_secs(60))
    }

    #[test]
    fn test_admits_until_full() {
        let limiter = limiter();
        let start = Instant::now();

        for i in 0..3 {
            assert!(limiter.can_admit_at(start + Duration::from_secs(i * 5)));
            limiter.record_at(start + Duration::from_secs(i * 5));
        }

        let now = start + Duration::from_secs(10);
        assert!(!limiter.can_admit_at(now));

        let wait = limiter.time_until_next_slot_at(now);
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(60));
        assert_eq!(wait, Duration::from_secs(50));
    }

    #[test]
    fn test_admits_again_after_window() {
        let limiter = limiter();
        let start = Instant::now();
        for i in 0..3 {
            limiter.record_at(start + Duration::from_secs(i));
        }

        let later = start + Duration::from_secs(62);
        assert!(limiter.can_admit_at(later));
        assert_eq!(limiter.time_until_next_slot_at(later), Duration::ZERO);
    }

    #[test]
    fn test_partial_expiry_frees_one_slot() {
        let limiter = limiter();
        let start = Instant::now();
        limiter.record_at(start);
        limiter.record_at(start + Duration::from_secs(30));
        limiter.record_at(start + Duration::from_secs(40));

        let now = start + Duration::from_secs(60);
        assert!(limiter.can_admit_at(now));
        limiter.record_at(now);
        assert!(!limiter.can_admit_at(now));
        assert_eq!(limiter.time_until_next_slot_at(now), Duration::from_secs(30));
    }

    #[test]
    fn test_check_records_and_rejects() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..3 {
            limiter.check_at("search", start).unwrap();
        }

        let err = limiter.check_at("search", start + Duration::from_secs(1)).unwrap_err();
        match err {
            PipelineError::RateLimited {
                service,
                operation,
                retry_after,
            } => {
                assert_eq!(service, ExternalService::Catalog);
                assert_eq!(operation, "search");
                assert_eq!(retry_after, Duration::from_secs(59));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_capacity_never_admits() {
        let limiter = RateLimiter::new(ExternalService::Inference, 0, Duration::from_secs(1));
        assert!(!limiter.can_admit());
        assert!(limiter.check("analyze").is_err());
    }
}
