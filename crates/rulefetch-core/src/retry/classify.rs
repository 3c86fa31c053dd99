//! Classify a failed attempt for retry decisions.

use crate::error::DispatchError;
use crate::request::Response;
use crate::transport::TransportErrorKind;

/// Outcome of one attempt that did not produce a usable response.
#[derive(Debug)]
pub enum AttemptFailure {
    /// A response whose status is in the retry `status_codes` list; the
    /// connection layer asks for another attempt.
    Status(Response),
    Error(DispatchError),
}

/// Transient judgment of a failure, recomputed for every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass<'a> {
    /// Malformed request (bad URL, unescaped characters); never succeeds.
    Structural,
    /// Explicit abort.
    Cancelled,
    /// Not a connection-layer retry signal.
    Foreign,
    Retryable {
        status: Option<u16>,
        retry_after: Option<&'a str>,
    },
}

pub fn classify(failure: &AttemptFailure) -> FailureClass<'_> {
    match failure {
        AttemptFailure::Status(resp) => FailureClass::Retryable {
            status: Some(resp.status),
            retry_after: resp.header("retry-after"),
        },
        AttemptFailure::Error(DispatchError::Cancelled) => FailureClass::Cancelled,
        AttemptFailure::Error(DispatchError::Transport(e)) => match e.kind {
            TransportErrorKind::Escaping => FailureClass::Structural,
            TransportErrorKind::Abort => FailureClass::Cancelled,
            kind if kind.is_retryable() => FailureClass::Retryable {
                status: None,
                retry_after: None,
            },
            _ => FailureClass::Foreign,
        },
        AttemptFailure::Error(DispatchError::InvalidRedirect { .. }) => FailureClass::Structural,
        AttemptFailure::Error(DispatchError::TooManyRedirects { .. }) => FailureClass::Foreign,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use url::Url;

    fn transport(kind: TransportErrorKind) -> AttemptFailure {
        AttemptFailure::Error(DispatchError::Transport(TransportError::new(kind, "x")))
    }

    #[test]
    fn escaping_is_structural_and_abort_is_cancelled() {
        assert_eq!(classify(&transport(TransportErrorKind::Escaping)), FailureClass::Structural);
        assert_eq!(classify(&transport(TransportErrorKind::Abort)), FailureClass::Cancelled);
        assert_eq!(
            classify(&AttemptFailure::Error(DispatchError::Cancelled)),
            FailureClass::Cancelled
        );
    }

    #[test]
    fn connection_errors_are_retryable() {
        for kind in [
            TransportErrorKind::Timeout,
            TransportErrorKind::ConnReset,
            TransportErrorKind::ConnRefused,
            TransportErrorKind::Dns,
        ] {
            assert_eq!(
                classify(&transport(kind)),
                FailureClass::Retryable {
                    status: None,
                    retry_after: None
                }
            );
        }
    }

    #[test]
    fn other_errors_are_foreign() {
        assert_eq!(classify(&transport(TransportErrorKind::Tls)), FailureClass::Foreign);
        assert_eq!(classify(&transport(TransportErrorKind::Other)), FailureClass::Foreign);
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            classify(&AttemptFailure::Error(DispatchError::TooManyRedirects { max: 5, url })),
            FailureClass::Foreign
        );
    }

    #[test]
    fn status_signal_carries_code_and_retry_after() {
        let mut resp = Response::new(503, Url::parse("https://example.com/").unwrap());
        resp.headers.insert("Retry-After", "2");
        let failure = AttemptFailure::Status(resp);
        assert_eq!(
            classify(&failure),
            FailureClass::Retryable {
                status: Some(503),
                retry_after: Some("2")
            }
        );
    }
}
