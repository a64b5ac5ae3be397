//! Retry decisions for the HTTP transport.
//!
//! A policy is a pure function of the error and the number of attempts made
//! so far. It never sleeps; the transport owns the timer.

use std::time::Duration;

use tracing::debug;

use crate::Error;

/// Base unit of the exponential backoff: `300ms * 2^attempts`.
const BACKOFF_UNIT: Duration = Duration::from_millis(300);

/// Decides whether a failed attempt should be sent again, and after how long.
///
/// `attempts` counts attempts already made, so it is 1 after the first failure.
pub trait RetryPolicy: Send + Sync {
    fn max_retries(&self) -> u32;

    fn max_delay(&self) -> Duration;

    fn should_retry(&self, err: &Error, attempts: u32) -> bool;

    /// Delay before the next attempt, or `None` to stop and surface `err`.
    fn delay_before_next(&self, err: &Error, attempts: u32) -> Option<Duration>;
}

/// Exponential backoff capped at `max_delay`, retrying transport failures and
/// HTTP 500/502/503.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRetryPolicy {
    pub max_retries: u32,
    pub max_delay: Duration,
}

impl DefaultRetryPolicy {
    pub fn new(max_retries: u32, max_delay: Duration) -> Self {
        Self {
            max_retries,
            max_delay,
        }
    }

    fn backoff(&self, attempts: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts).unwrap_or(u32::MAX);
        BACKOFF_UNIT
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }
}

impl Default for DefaultRetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(20))
    }
}

impl RetryPolicy for DefaultRetryPolicy {
    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn max_delay(&self) -> Duration {
        self.max_delay
    }

    fn should_retry(&self, err: &Error, attempts: u32) -> bool {
        if attempts > self.max_retries {
            return false;
        }
        match err {
            Error::Transport(e) => {
                debug!(error = %e, attempts, "retrying after transport failure");
                true
            }
            Error::Remote { status, .. } => {
                let retry = matches!(status, 500 | 502 | 503);
                if retry {
                    debug!(http_status = status, attempts, "retrying after server error");
                }
                retry
            }
            _ => false,
        }
    }

    fn delay_before_next(&self, err: &Error, attempts: u32) -> Option<Duration> {
        if !self.should_retry(err, attempts) {
            return None;
        }
        let delay = self.backoff(attempts);
        if delay.is_zero() {
            None
        } else {
            Some(delay)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use crate::ErrorContext;

    fn remote(status: u16) -> Error {
        Error::Remote {
            status,
            body: String::new(),
            context: ErrorContext::new(),
        }
    }

    fn transport() -> Error {
        Error::Transport(TransportError::Other("connection refused".into()))
    }

    #[test]
    fn test_classification() {
        let policy = DefaultRetryPolicy::default();
        assert!(policy.should_retry(&transport(), 1));
        for status in [500, 502, 503] {
            assert!(policy.should_retry(&remote(status), 1), "{status}");
        }
        for status in [400, 401, 403, 404, 409, 429, 501, 504] {
            assert!(!policy.should_retry(&remote(status), 1), "{status}");
        }
        assert!(!policy.should_retry(&Error::NotImplemented("x"), 1));
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        let policy = DefaultRetryPolicy::new(10, Duration::from_secs(5));
        let err = remote(503);
        assert_eq!(
            policy.delay_before_next(&err, 1),
            Some(Duration::from_millis(600))
        );
        assert_eq!(
            policy.delay_before_next(&err, 2),
            Some(Duration::from_millis(1200))
        );
        assert_eq!(
            policy.delay_before_next(&err, 3),
            Some(Duration::from_millis(2400))
        );
        assert_eq!(
            policy.delay_before_next(&err, 4),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            policy.delay_before_next(&err, 10),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_delay_bounded_and_stops_after_max_retries() {
        for max_retries in 0..6u32 {
            for max_delay_ms in [1u64, 250, 700, 20_000] {
                let policy =
                    DefaultRetryPolicy::new(max_retries, Duration::from_millis(max_delay_ms));
                for attempts in 0..=max_retries {
                    let delay = policy
                        .delay_before_next(&transport(), attempts)
                        .expect("within retry budget");
                    assert!(delay <= policy.max_delay());
                }
                assert_eq!(policy.delay_before_next(&transport(), max_retries + 1), None);
                assert_eq!(policy.delay_before_next(&transport(), max_retries + 7), None);
            }
        }
    }

    #[test]
    fn test_huge_attempt_count_does_not_overflow() {
        let policy = DefaultRetryPolicy::new(u32::MAX, Duration::from_secs(20));
        assert_eq!(
            policy.delay_before_next(&transport(), 64),
            Some(Duration::from_secs(20))
        );
    }

    #[test]
    fn test_zero_max_delay_means_stop() {
        let policy = DefaultRetryPolicy::new(3, Duration::ZERO);
        assert_eq!(policy.delay_before_next(&remote(500), 1), None);
    }
}
