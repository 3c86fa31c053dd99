//! Fetch façade: the single entry point callers use.
//!
//! Runs the request through the client's chain, turns non-success final
//! responses into [`FetchError`], and logs every failure before returning it.
//! Nothing is retried here and nothing is swallowed.

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::HttpClient;
use crate::error::{DispatchError, FetchError, FetchFailure, UrlError};
use crate::request::{is_http_url, HeaderList, Method, Request, Response};
use crate::retry::RetryOptions;

pub const DEFAULT_USER_AGENT: &str = concat!("rulefetch/", env!("CARGO_PKG_VERSION"));

/// Anything that names a fetch target.
pub trait IntoUrl {
    fn into_url(self) -> Result<Url, FetchFailure>;
}

fn http_only(url: Url) -> Result<Url, FetchFailure> {
    if is_http_url(&url) {
        return Ok(url);
    }
    Err(FetchFailure::InvalidUrl {
        input: url.to_string(),
        source: UrlError::UnsupportedScheme(url.scheme().to_string()),
    })
}

impl IntoUrl for Url {
    fn into_url(self) -> Result<Url, FetchFailure> {
        http_only(self)
    }
}

impl IntoUrl for &Url {
    fn into_url(self) -> Result<Url, FetchFailure> {
        http_only(self.clone())
    }
}

impl IntoUrl for &str {
    fn into_url(self) -> Result<Url, FetchFailure> {
        let url = Url::parse(self).map_err(|e| FetchFailure::InvalidUrl {
            input: self.to_string(),
            source: e.into(),
        })?;
        http_only(url)
    }
}

impl IntoUrl for String {
    fn into_url(self) -> Result<Url, FetchFailure> {
        self.as_str().into_url()
    }
}

impl IntoUrl for &String {
    fn into_url(self) -> Result<Url, FetchFailure> {
        self.as_str().into_url()
    }
}

/// Per-call options. The default is a GET carrying the fixed `User-Agent`.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: HeaderList,
    pub body: Option<Bytes>,
    /// Overrides the client's retry defaults for this call.
    pub retry: Option<RetryOptions>,
    /// Aborts the request (including any pending backoff) when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        let mut headers = HeaderList::new();
        headers.insert("User-Agent", DEFAULT_USER_AGENT);
        Self {
            method: Method::Get,
            headers,
            body: None,
            retry: None,
            cancel: None,
        }
    }
}

impl FetchOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn retry(mut self, retry: RetryOptions) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Fetch `target` through `client`.
///
/// Any final status >= 400, or any other non-2xx status except 304, becomes a
/// [`FetchFailure::Status`]. Failures are logged (aborts separately from other
/// errors) and returned unchanged.
pub async fn fetch_with_log(
    client: &HttpClient,
    target: impl IntoUrl,
    options: FetchOptions,
) -> Result<Response, FetchFailure> {
    let outcome = match target.into_url() {
        Ok(url) => fetch_inner(client, url, options).await,
        Err(e) => Err(e),
    };

    if let Err(e) = &outcome {
        if e.is_cancelled() {
            tracing::warn!("[fetch] abort: {}", e);
        } else {
            tracing::error!("[fetch] failed: {}", e);
        }
    }
    outcome
}

async fn fetch_inner(
    client: &HttpClient,
    url: Url,
    options: FetchOptions,
) -> Result<Response, FetchFailure> {
    let cancel = options.cancel.unwrap_or_default();
    let request = Request {
        method: options.method,
        url,
        headers: options.headers,
        body: options.body,
        retry: options.retry,
        cancel: cancel.clone(),
    };

    // Dropping the dispatch future abandons any in-flight attempt or backoff.
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DispatchError::Cancelled),
        result = client.dispatch(request) => result,
    }?;

    if is_failure_status(response.status) {
        return Err(FetchError::from_response(&response).into());
    }
    Ok(response)
}

/// 304 counts as success for conditional fetches.
fn is_failure_status(status: u16) -> bool {
    status >= 400 || (!(200..300).contains(&status) && status != 304)
}
