use std::time::Duration;

pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDelay {
    Fixed(Duration),
    Exponential { base: Duration, max: Duration },
}

/// How long to wait between rate-limited attempts and when to give up.
///
/// `max_retries: None` retries forever; the executor's cancellation token is
/// then the only way out of a long rate-limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: RetryDelay,
    max_retries: Option<u32>,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay: RetryDelay::Fixed(delay),
            max_retries: None,
        }
    }

    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self {
            delay: RetryDelay::Exponential { base, max },
            max_retries: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Delay before retry number `retry` (zero based), or `None` once the
    /// policy is exhausted.
    pub fn delay(&self, retry: u32) -> Option<Duration> {
        if self.max_retries.is_some_and(|max| retry >= max) {
            return None;
        }
        Some(match self.delay {
            RetryDelay::Fixed(delay) => delay,
            RetryDelay::Exponential { base, max } => {
                let base_ms = base.as_millis().min(u128::from(u64::MAX)) as u64;
                let max_ms = max.as_millis().min(u128::from(u64::MAX)) as u64;
                let shift = retry.min(16);
                Duration::from_millis(base_ms.saturating_mul(1u64 << shift).min(max_ms))
            }
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RATE_LIMIT_WAIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_waits_a_minute_forever() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), None);
        assert_eq!(policy.delay(0), Some(Duration::from_secs(60)));
        assert_eq!(policy.delay(10_000), Some(Duration::from_secs(60)));
    }

    #[test]
    fn bounded_policy_gives_up() {
        let policy = RetryPolicy::fixed(Duration::from_secs(1)).with_max_retries(2);
        assert_eq!(policy.delay(0), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay(2), None);
    }

    #[test]
    fn exponential_policy_doubles_up_to_cap() {
        let policy =
            RetryPolicy::exponential(Duration::from_millis(100), Duration::from_millis(800));
        assert_eq!(policy.delay(0), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay(1), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay(2), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay(3), Some(Duration::from_millis(800)));
        assert_eq!(policy.delay(40), Some(Duration::from_millis(800)));
    }
}
