//! Retry loop as a middleware: re-issue the rest of the chain until it
//! succeeds or the policy says stop.

use async_trait::async_trait;
use chrono::Utc;

use super::classify::AttemptFailure;
use super::policy::{RetryDecision, RetryOptions, RetryState};
use crate::dispatch::{Middleware, Next};
use crate::error::DispatchError;
use crate::request::{Request, Response};

pub struct RetryMiddleware {
    defaults: RetryOptions,
}

impl RetryMiddleware {
    pub fn new(defaults: RetryOptions) -> Self {
        Self { defaults }
    }
}

#[async_trait]
impl Middleware for RetryMiddleware {
    async fn attempt(&self, request: Request, next: Next<'_>) -> Result<Response, DispatchError> {
        let options = request.retry.as_ref().unwrap_or(&self.defaults);
        let mut state = RetryState::new();

        loop {
            let failure = match next.run(request.clone()).await {
                Ok(resp) if options.retries_status(resp.status) => AttemptFailure::Status(resp),
                Ok(resp) => return Ok(resp),
                Err(e) => AttemptFailure::Error(e),
            };

            let delay = match options.decide(request.method, &failure, &state, Utc::now()) {
                RetryDecision::RetryAfter(d) => d,
                RetryDecision::NoRetry => {
                    return match failure {
                        // Out of retries on a status signal: the response itself is the result.
                        AttemptFailure::Status(resp) => Ok(resp),
                        AttemptFailure::Error(e) => Err(e),
                    };
                }
            };

            match &failure {
                AttemptFailure::Status(resp) => tracing::warn!(
                    url = %request.url,
                    attempt = state.attempt(),
                    delay_ms = delay.as_millis() as u64,
                    "retrying after HTTP {}",
                    resp.status
                ),
                AttemptFailure::Error(e) => tracing::warn!(
                    url = %request.url,
                    attempt = state.attempt(),
                    delay_ms = delay.as_millis() as u64,
                    "retrying after error: {}",
                    e
                ),
            }

            tokio::select! {
                _ = request.cancel.cancelled() => return Err(DispatchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            state.advance();
        }
    }
}
