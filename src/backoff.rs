//! Wait-time strategies consulted by the connector between failed dials.

use std::time::Duration;

/// Maps the number of failed dials so far to the wait before the next one.
///
/// `attempt` is 1 after the first failure. `base` is the configured
/// [`ConnectParams::backoff`](crate::ConnectParams::backoff).
pub trait BackoffPolicy: Send + Sync {
    fn wait_time(&self, attempt: u32, base: Duration) -> Duration;
}

/// Constant wait: returns `base` for every attempt.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FixedBackoff;

impl BackoffPolicy for FixedBackoff {
    fn wait_time(&self, _attempt: u32, base: Duration) -> Duration {
        base
    }
}

/// Doubling wait, `base * 2^(attempt - 1)`, capped at `max`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExponentialBackoff {
    pub max: Duration,
}

impl ExponentialBackoff {
    pub fn new(max: Duration) -> Self {
        Self { max }
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn wait_time(&self, attempt: u32, base: Duration) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        base.saturating_mul(1u32 << exp).min(self.max)
    }
}

impl<F> BackoffPolicy for F
where
    F: Fn(u32, Duration) -> Duration + Send + Sync,
{
    fn wait_time(&self, attempt: u32, base: Duration) -> Duration {
        self(attempt, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ignores_attempt_number() {
        let base = Duration::from_secs(2);
        for attempt in [1, 2, 7, u32::MAX] {
            assert_eq!(FixedBackoff.wait_time(attempt, base), base);
        }
    }

    #[test]
    fn exponential_doubles_and_caps() {
        let policy = ExponentialBackoff::new(Duration::from_millis(1_000));
        let base = Duration::from_millis(100);
        assert_eq!(policy.wait_time(1, base), Duration::from_millis(100));
        assert_eq!(policy.wait_time(2, base), Duration::from_millis(200));
        assert_eq!(policy.wait_time(4, base), Duration::from_millis(800));
        assert_eq!(policy.wait_time(5, base), Duration::from_millis(1_000));
        assert_eq!(policy.wait_time(u32::MAX, base), Duration::from_millis(1_000));
    }

    #[test]
    fn closures_are_policies() {
        let linear = |attempt: u32, base: Duration| base * attempt;
        assert_eq!(
            linear.wait_time(3, Duration::from_millis(10)),
            Duration::from_millis(30)
        );
    }
}
