//! Delay strategy between lookup attempts.
//!
//! A strategy is just a function from the 1-based retry number to a
//! duration.  Production uses [`Backoff::exponential`] (2 s, 4 s, 8 s,
//! ...); tests substitute [`Backoff::none`] to assert retry counts
//! without waiting.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on the exponent, so large retry counts cannot overflow.
const MAX_EXPONENT: u32 = 16;

#[derive(Clone)]
pub struct Backoff(Arc<dyn Fn(u32) -> Duration + Send + Sync>);

impl Backoff {
    /// `2^retry` seconds before retry `retry`.
    pub fn exponential() -> Self {
        Self::exponential_from(Duration::from_secs(1))
    }

    /// `base * 2^retry` before retry `retry`.
    pub fn exponential_from(base: Duration) -> Self {
        Self::from_fn(move |retry| base * 2u32.pow(retry.min(MAX_EXPONENT)))
    }

    /// Never wait.
    pub fn none() -> Self {
        Self::from_fn(|_| Duration::ZERO)
    }

    pub fn from_fn(f: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        (self.0)(retry)
    }

    /// Sum of every delay a lookup with `max_attempts` attempts may wait.
    pub fn worst_case(&self, max_attempts: u32) -> Duration {
        (1..max_attempts).map(|retry| self.delay(retry)).sum()
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::exponential()
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Backoff")
            .field(&self.delay(1))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_sequence() {
        let backoff = Backoff::exponential();
        let secs: Vec<u64> = (1..=5).map(|r| backoff.delay(r).as_secs()).collect();
        assert_eq!(secs, vec![2, 4, 8, 16, 32]);
    }

    #[test]
    fn exponent_is_clamped() {
        let backoff = Backoff::exponential();
        assert_eq!(backoff.delay(100), backoff.delay(MAX_EXPONENT));
    }

    #[test]
    fn none_never_waits() {
        let backoff = Backoff::none();
        assert_eq!(backoff.delay(1), Duration::ZERO);
        assert_eq!(backoff.worst_case(10), Duration::ZERO);
    }

    #[test]
    fn worst_case_sums_retries_only() {
        // 3 attempts -> 2 retries -> 2 s + 4 s
        assert_eq!(Backoff::exponential().worst_case(3), Duration::from_secs(6));
        assert_eq!(Backoff::exponential().worst_case(1), Duration::ZERO);
    }

    #[test]
    fn custom_function() {
        let backoff = Backoff::from_fn(|retry| Duration::from_millis(u64::from(retry) * 10));
        assert_eq!(backoff.delay(3), Duration::from_millis(30));
    }
}
