use std::time::Duration;

/// Decides whether, and after how long, a dropped connection is retried
///
/// `attempt` is the number of reconnection attempts already scheduled since
/// the last successful open (0 for the first retry after a drop).
pub trait ReconnectionStrategy: Send + Sync {
    /// Delay before the next attempt, or `None` once the budget is spent
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Upper bound on attempts between two successful opens (`None` = unbounded)
    fn max_attempts(&self) -> Option<usize>;

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.max_attempts().map_or(true, |max| attempt < max)
    }
}

/// Fixed delay between attempts, bounded attempt count
///
/// This is the default policy: wait `delay`, retry, up to `max_attempts`
/// times before giving up.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self { delay, max_attempts }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        self.should_reconnect(attempt).then_some(self.delay)
    }

    fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }
}

/// Doubling delay starting at `initial_delay`, capped at `max_delay`
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<usize>,
}

impl ExponentialBackoff {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<usize>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
        }
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }

        // 2^31 already dwarfs any sane cap
        let factor = 1u32 << attempt.min(31);
        let delay = self
            .initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay);
        Some(delay.min(self.max_delay))
    }

    fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }
}

/// Never retries; a dropped connection stays down until `connect()` is called
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: usize) -> Option<Duration> {
        None
    }

    fn max_attempts(&self) -> Option<usize> {
        Some(0)
    }
}
