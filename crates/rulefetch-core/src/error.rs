//! Errors surfaced by the dispatch pipeline and the fetch façade.

use url::Url;

use crate::request::Response;
use crate::transport::{TransportError, TransportErrorKind};

/// Terminal failure of the middleware chain.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("maximum redirections ({max}) exceeded at {url}")]
    TooManyRedirects { max: usize, url: Url },
    #[error("invalid redirect location {location:?} from {url}")]
    InvalidRedirect { location: String, url: Url },
    #[error("request aborted")]
    Cancelled,
}

impl DispatchError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            DispatchError::Cancelled => true,
            DispatchError::Transport(e) => e.kind == TransportErrorKind::Abort,
            _ => false,
        }
    }
}

/// A final response that is not a success, turned into an error by the façade.
///
/// `code` and `status_code` hold the same value; callers written against
/// either name keep working.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status_code} {message} ({url})")]
pub struct FetchError {
    pub code: u16,
    pub status_code: u16,
    pub url: Url,
    pub message: String,
}

impl FetchError {
    pub fn from_response(response: &Response) -> Self {
        let message = if response.status_text.is_empty() {
            format!("HTTP {}", response.status)
        } else {
            response.status_text.clone()
        };
        Self {
            code: response.status,
            status_code: response.status,
            url: response.url.clone(),
            message,
        }
    }
}

/// Why a fetch target was rejected before any request was made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),
    #[error("unsupported scheme {0:?}, only http and https are fetched")]
    UnsupportedScheme(String),
}

/// Everything `fetch_with_log` can fail with.
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    #[error("invalid URL {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: UrlError,
    },
    #[error(transparent)]
    Status(#[from] FetchError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl FetchFailure {
    /// True when the request was aborted by its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchFailure::Dispatch(e) if e.is_cancelled())
    }

    /// Status code of the response that caused the failure, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchFailure::Status(e) => Some(e.status_code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_takes_message_from_status_line() {
        let mut resp = Response::new(404, Url::parse("https://example.com/x").unwrap());
        resp.status_text = "Not Found".to_string();
        let err = FetchError::from_response(&resp);
        assert_eq!(err.code, 404);
        assert_eq!(err.status_code, 404);
        assert_eq!(err.message, "Not Found");
        assert_eq!(err.url.as_str(), "https://example.com/x");
        assert_eq!(err.to_string(), "404 Not Found (https://example.com/x)");
    }

    #[test]
    fn fetch_error_without_reason_phrase() {
        let resp = Response::new(502, Url::parse("https://example.com/").unwrap());
        assert_eq!(FetchError::from_response(&resp).message, "HTTP 502");
    }

    #[test]
    fn cancellation_is_detected_through_transport_abort() {
        let abort = DispatchError::Transport(TransportError::new(
            TransportErrorKind::Abort,
            "callback aborted",
        ));
        assert!(FetchFailure::from(abort).is_cancelled());
        assert!(FetchFailure::from(DispatchError::Cancelled).is_cancelled());
        let timeout = DispatchError::Transport(TransportError::new(
            TransportErrorKind::Timeout,
            "timed out",
        ));
        assert!(!FetchFailure::from(timeout).is_cancelled());
    }
}
