//! Request and response model shared by the façade, the middleware chain and
//! the transport.
//!
//! Bodies are opaque bytes; nothing in this crate interprets them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::retry::RetryOptions;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Options,
    Put,
    Delete,
    Trace,
    Post,
    Patch,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Trace => "TRACE",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "TRACE" => Ok(Method::Trace),
            "POST" => Ok(Method::Post),
            "PATCH" => Ok(Method::Patch),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

/// Only plain and TLS HTTP leave this crate; everything else (file, ftp, ...)
/// is refused before it reaches curl.
pub fn is_http_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList(Vec<(String, String)>);

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set `name` to `value`, replacing every existing value for that name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.0.push((name, value.into()));
    }

    /// Add a value without touching existing ones (e.g. repeated `Set-Cookie`).
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderList::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// One logical request as it travels down the middleware chain.
///
/// Cloned for every physical attempt; the cancellation token is shared by all
/// clones so an abort reaches whichever attempt is in flight.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderList,
    pub body: Option<Bytes>,
    /// Per-call override of the client's retry defaults.
    pub retry: Option<RetryOptions>,
    pub cancel: CancellationToken,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderList::new(),
            body: None,
            retry: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }
}

/// Response of one physical attempt (or of the whole chain once it returns).
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Reason phrase from the status line, e.g. `Not Found`. May be empty (HTTP/2).
    pub status_text: String,
    /// Effective URL after any redirects.
    pub url: Url,
    pub headers: HeaderList,
    pub body: Bytes,
    pub redirected: bool,
}

impl Response {
    pub fn new(status: u16, url: Url) -> Self {
        Self {
            status,
            status_text: String::new(),
            url,
            headers: HeaderList::new(),
            body: Bytes::new(),
            redirected: false,
        }
    }

    /// True for 2xx.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}
