//! Base transport: one physical HTTP attempt.
//!
//! Errors are tagged once here (`TransportErrorKind`) so the retry engine
//! switches on the tag instead of inspecting error text.

mod classify;
mod easy;
mod parse;

use async_trait::async_trait;
use std::fmt;

use crate::request::{Request, Response};

pub use self::classify::classify_curl_error;
pub use self::easy::{CurlOptions, CurlTransport};

/// Performs exactly one network round-trip. Never follows redirects.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connect or transfer timed out.
    Timeout,
    /// Connection dropped mid-exchange (reset, empty reply, short read).
    ConnReset,
    /// Nothing listening / connect failed.
    ConnRefused,
    /// Host or proxy name could not be resolved.
    Dns,
    /// Malformed URL or unescaped characters in the request line or headers.
    Escaping,
    /// Transfer aborted because the request was cancelled.
    Abort,
    /// TLS handshake or certificate failure.
    Tls,
    Other,
}

impl TransportErrorKind {
    /// Kinds the connection layer flags as worth another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            TransportErrorKind::Timeout
                | TransportErrorKind::ConnReset
                | TransportErrorKind::ConnRefused
                | TransportErrorKind::Dns
        )
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::ConnReset => "connection reset",
            TransportErrorKind::ConnRefused => "connection refused",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Escaping => "invalid request",
            TransportErrorKind::Abort => "aborted",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Other => "transport",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<crate::dns::DnsError> for TransportError {
    fn from(e: crate::dns::DnsError) -> Self {
        TransportError::new(TransportErrorKind::Dns, e.to_string())
    }
}
