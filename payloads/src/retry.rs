//! The one retry policy shared by the HTTP client and by callers that want
//! operation-level retries.

use std::time::Duration;

/// Coarse classification of a failure for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// No response at all: connection refused, reset, timed out.
    Network,
    /// The server answered with a 5xx.
    Server,
    /// The server answered with a 4xx, or the response was unusable.
    Client,
    /// Anything the error type cannot classify.
    Unknown,
}

/// Errors that can tell a retry policy what kind of failure they are.
pub trait Retryable {
    fn retry_class(&self) -> RetryClass {
        RetryClass::Unknown
    }
}

impl Retryable for crate::ClientError {
    fn retry_class(&self) -> RetryClass {
        use crate::ClientError;
        match self {
            ClientError::Network(_) | ClientError::Timeout => {
                RetryClass::Network
            }
            ClientError::APIError(details)
                if details.status.is_server_error() =>
            {
                RetryClass::Server
            }
            ClientError::APIError(_)
            | ClientError::SessionExpired
            | ClientError::Decode(_) => RetryClass::Client,
        }
    }
}

impl Retryable for anyhow::Error {
    fn retry_class(&self) -> RetryClass {
        self.downcast_ref::<crate::ClientError>()
            .map(<crate::ClientError as Retryable>::retry_class)
            .unwrap_or(RetryClass::Unknown)
    }
}

impl Retryable for String {}

/// Retry network and server failures and anything unclassified; never
/// retry client errors.
pub fn transient_failures(class: RetryClass) -> bool {
    !matches!(class, RetryClass::Client)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * 2^attempt`
    Exponential { base: Duration },
    /// `step * attempt`
    Linear { step: Duration },
}

impl Backoff {
    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(attempt))
            }
            Backoff::Linear { step } => step.saturating_mul(attempt),
        }
    }
}

/// How many times to try an operation, how long to wait between tries and
/// which failures are worth another try.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `1` disables retries.
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub retry_on: fn(RetryClass) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Linear {
                step: Duration::ZERO,
            },
            retry_on: transient_failures,
        }
    }

    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { base },
            retry_on: transient_failures,
        }
    }

    /// `retry_count` retries after the first attempt, waiting
    /// `retry_delay * attempt` between them.
    pub fn linear(retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: retry_count.saturating_add(1),
            backoff: Backoff::Linear { step: retry_delay },
            retry_on: transient_failures,
        }
    }

    pub fn with_predicate(mut self, retry_on: fn(RetryClass) -> bool) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Whether a failure on `attempt` (1-based) should be followed by
    /// another attempt.
    pub fn should_retry<E: Retryable + ?Sized>(
        &self,
        attempt: u32,
        error: &E,
    ) -> bool {
        attempt < self.max_attempts && (self.retry_on)(error.retry_class())
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{APIErrorDetails, ClientError};
    use reqwest::StatusCode;

    fn api_error(status: StatusCode) -> ClientError {
        ClientError::APIError(APIErrorDetails {
            status,
            message: "boom".into(),
            code: None,
            details: None,
        })
    }

    #[test]
    fn exponential_delays_strictly_increase() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (1..=4).map(|a| policy.delay(a)).collect();
        assert_eq!(delays[0], Duration::from_secs(2));
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn linear_delays_scale_with_attempt() {
        let policy = RetryPolicy::linear(3, Duration::from_millis(100));
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(3), Duration::from_millis(300));
    }

    #[test]
    fn client_errors_are_not_retried() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1, &api_error(StatusCode::BAD_GATEWAY)));
        assert!(!policy.should_retry(1, &api_error(StatusCode::NOT_FOUND)));
        assert!(!policy.should_retry(1, &ClientError::SessionExpired));
        assert!(policy.should_retry(2, &ClientError::Timeout));
        assert!(!policy.should_retry(3, &ClientError::Timeout));
    }

    #[test]
    fn unknown_errors_are_retried_by_default() {
        let policy = RetryPolicy::linear(1, Duration::ZERO);
        let error = anyhow::anyhow!("something odd");
        assert!(policy.should_retry(1, &error));
        let wrapped = anyhow::Error::from(api_error(StatusCode::CONFLICT));
        assert!(!policy.should_retry(1, &wrapped));
    }

    #[test]
    fn disabled_policy_never_retries() {
        let policy = RetryPolicy::none();
        assert!(!policy.should_retry(1, &ClientError::Timeout));
    }
}
