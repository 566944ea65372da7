use std::time::Instant;

/// Lazily refilled token bucket. One per feature category so a burst against
/// one endpoint cannot starve the others.
///
/// `allow` never blocks and never fails: it refills from the elapsed wall
/// time since the previous check, capped at capacity, then admits if a whole
/// cost's worth of tokens is available. Denial leaves the refilled balance
/// untouched.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    tokens: f64,
    last: Instant,
}

impl TokenBucket {
    /// A bucket starts full.
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_per_sec,
            tokens: f64::from(capacity),
            last: Instant::now(),
        }
    }

    pub fn allow(&mut self) -> bool {
        self.allow_at(Instant::now(), 1.0)
    }

    // Clock-injected seam so tests can drive simulated time.
    fn allow_at(&mut self, now: Instant, cost: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last = now;
        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn full_bucket_admits_capacity_then_denies() {
        let mut bucket = TokenBucket::new(5, 5.0);
        let now = Instant::now();
        for _ in 0..5 {
            assert!(bucket.allow_at(now, 1.0));
        }
        assert!(!bucket.allow_at(now, 1.0));
    }

    #[test]
    fn refill_readmits_after_one_second() {
        let mut bucket = TokenBucket::new(5, 5.0);
        let now = Instant::now();
        for _ in 0..5 {
            assert!(bucket.allow_at(now, 1.0));
        }
        assert!(!bucket.allow_at(now, 1.0));
        assert!(bucket.allow_at(now + Duration::from_secs(1), 1.0));
    }

    #[test]
    fn refill_never_exceeds_capacity() {
        let mut bucket = TokenBucket::new(2, 100.0);
        let now = Instant::now();
        assert!(bucket.allow_at(now + Duration::from_secs(60), 1.0));
        assert!(bucket.allow_at(now + Duration::from_secs(60), 1.0));
        assert!(!bucket.allow_at(now + Duration::from_secs(60), 1.0));
    }

    #[test]
    fn denial_does_not_spend_tokens() {
        let mut bucket = TokenBucket::new(1, 0.0);
        let now = Instant::now();
        assert!(bucket.allow_at(now, 1.0));
        assert!(!bucket.allow_at(now, 1.0));
        // a half-token cost would still be denied without prior refill
        assert!(!bucket.allow_at(now, 1.0));
    }
}
