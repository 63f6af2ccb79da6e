//! Frame-rate cap
//!
//! GCRA limiter with a burst of one: a frame is admitted once a full frame
//! interval has passed since the last admitted frame.

use std::time::Duration;

use governor::clock::{Clock, MonotonicClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Admits at most one frame per quota interval
pub struct FrameThrottle<C: Clock = MonotonicClock> {
    quota: Quota,
    clock: C,
    limiter: RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<C::Instant>>,
}

impl FrameThrottle {
    /// Throttle on the wall clock
    pub fn new(quota: Quota) -> Self {
        Self::with_clock(quota, MonotonicClock)
    }
}

impl<C: Clock> FrameThrottle<C> {
    /// Throttle reading time from `clock`
    pub fn with_clock(quota: Quota, clock: C) -> Self {
        let limiter = RateLimiter::direct_with_clock(quota, &clock);
        Self {
            quota,
            clock,
            limiter,
        }
    }

    pub fn interval(&self) -> Duration {
        self.quota.replenish_interval()
    }

    /// Whether a frame arriving now should be decoded.
    /// Admitting a frame starts the next interval.
    pub fn ready(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Forget the last admitted frame (after a camera restart)
    pub fn reset(&mut self) {
        self.limiter = RateLimiter::direct_with_clock(self.quota, &self.clock);
    }
}
