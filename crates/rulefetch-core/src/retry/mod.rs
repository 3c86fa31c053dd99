//! Retry classification and backoff.
//!
//! Every failed attempt is classified first (structural, cancelled, foreign,
//! retryable) and only then given a delay, so failures that can never succeed
//! are returned before any wait is incurred.

pub mod backoff;
mod classify;
mod middleware;
mod policy;

pub use classify::{classify, AttemptFailure, FailureClass};
pub use middleware::RetryMiddleware;
pub use policy::{
    RetryDecision, RetryOptions, RetryState, DEFAULT_RETRY_METHODS, DEFAULT_RETRY_STATUS_CODES,
    NON_RETRIABLE_STATUS_CODES,
};
