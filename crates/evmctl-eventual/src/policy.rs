use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Spacing between attempts and the overall budget of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Arguments of one `eventually` call: optional timings plus the value handed
/// to every attempt.
#[derive(Debug, Clone)]
pub struct PollArgs<A> {
    pub interval: Option<Duration>,
    pub timeout: Option<Duration>,
    pub pass_on: A,
}

impl<A> PollArgs<A> {
    pub fn new(pass_on: A) -> Self {
        Self {
            interval: None,
            timeout: None,
            pass_on,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Effective policy. Unset or zero durations take the defaults.
    pub fn policy(&self) -> RetryPolicy {
        let pick = |d: Option<Duration>, default: Duration| match d {
            Some(d) if !d.is_zero() => d,
            _ => default,
        };
        RetryPolicy {
            interval: pick(self.interval, DEFAULT_INTERVAL),
            timeout: pick(self.timeout, DEFAULT_TIMEOUT),
        }
    }
}

impl From<RetryPolicy> for PollArgs<()> {
    fn from(policy: RetryPolicy) -> Self {
        PollArgs::new(()).interval(policy.interval).timeout(policy.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(
            PollArgs::new(()).policy(),
            RetryPolicy {
                interval: Duration::from_millis(500),
                timeout: Duration::from_secs(30),
            }
        );
    }

    #[test]
    fn zero_falls_back_to_default() {
        let args = PollArgs::new(()).interval(Duration::ZERO).timeout(Duration::from_secs(2));
        let policy = args.policy();
        assert_eq!(policy.interval, DEFAULT_INTERVAL);
        assert_eq!(policy.timeout, Duration::from_secs(2));
    }

    #[test]
    fn from_policy_round_trips() {
        let policy = RetryPolicy {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(100),
        };
        assert_eq!(PollArgs::from(policy).policy(), policy);
    }
}
