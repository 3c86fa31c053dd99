use chrono::{DateTime, Utc};
use std::time::Duration;

use super::backoff;
use super::classify::{classify, AttemptFailure, FailureClass};
use crate::request::Method;

/// Methods retried unless the caller configures otherwise.
pub const DEFAULT_RETRY_METHODS: [Method; 6] = [
    Method::Get,
    Method::Head,
    Method::Options,
    Method::Put,
    Method::Delete,
    Method::Trace,
];

/// Response statuses the connection layer turns into a retry signal.
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 5] = [500, 502, 503, 504, 429];

/// The request itself is wrong; retrying only burns time and rate limit.
pub const NON_RETRIABLE_STATUS_CODES: [u16; 4] = [401, 403, 404, 405];

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; surface the failure.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Retry budget and backoff schedule for one logical request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOptions {
    pub max_retries: u32,
    pub min_timeout: Duration,
    pub max_timeout: Duration,
    pub timeout_factor: f64,
    pub methods: Vec<Method>,
    pub status_codes: Vec<u16>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 5,
            min_timeout: Duration::from_millis(500),
            max_timeout: Duration::from_millis(30_000),
            timeout_factor: 2.0,
            methods: DEFAULT_RETRY_METHODS.to_vec(),
            status_codes: DEFAULT_RETRY_STATUS_CODES.to_vec(),
        }
    }
}

/// Attempt counter of one logical request. Starts at 1 on the first failure
/// and only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
}

impl RetryState {
    pub fn new() -> Self {
        Self { attempt: 1 }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn advance(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryOptions {
    /// Defaults used by clients built from configuration: a slower first
    /// backoff step than the library default.
    pub fn system_default() -> Self {
        Self {
            min_timeout: Duration::from_millis(10_000),
            ..Self::default()
        }
    }

    /// Whether a response with this status should be treated as a retry signal.
    pub fn retries_status(&self, status: u16) -> bool {
        self.status_codes.contains(&status)
    }

    /// Decide whether `failure` gets another attempt and after what delay.
    ///
    /// Checks run in order and the first one that rejects wins: structural or
    /// cancelled failures, foreign errors, budget, method allow-list,
    /// non-retriable status. Only then is a delay computed.
    pub fn decide(
        &self,
        method: Method,
        failure: &AttemptFailure,
        state: &RetryState,
        now: DateTime<Utc>,
    ) -> RetryDecision {
        let (status, retry_after) = match classify(failure) {
            FailureClass::Structural | FailureClass::Cancelled | FailureClass::Foreign => {
                return RetryDecision::NoRetry;
            }
            FailureClass::Retryable {
                status,
                retry_after,
            } => (status, retry_after),
        };

        if state.attempt() > self.max_retries {
            return RetryDecision::NoRetry;
        }
        if !self.methods.contains(&method) {
            return RetryDecision::NoRetry;
        }
        if status.is_some_and(|s| NON_RETRIABLE_STATUS_CODES.contains(&s)) {
            return RetryDecision::NoRetry;
        }

        RetryDecision::RetryAfter(backoff::delay_for(
            state.attempt(),
            retry_after,
            self.min_timeout,
            self.max_timeout,
            self.timeout_factor,
            now,
        ))
    }
}
