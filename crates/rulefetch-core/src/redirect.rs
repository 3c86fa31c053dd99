//! Redirect follower.
//!
//! Re-issues the request against `Location` up to a fixed number of hops.
//! Sits inside the retry middleware, so a whole redirect chain counts as one
//! attempt of the logical request.

use async_trait::async_trait;
use url::Url;

use crate::dispatch::{Middleware, Next};
use crate::error::DispatchError;
use crate::request::{is_http_url, Method, Request, Response};

pub const DEFAULT_MAX_REDIRECTIONS: usize = 5;

const REDIRECT_STATUSES: [u16; 6] = [300, 301, 302, 303, 307, 308];

/// Headers that must not leak to another origin.
const CREDENTIAL_HEADERS: [&str; 3] = ["authorization", "cookie", "proxy-authorization"];

/// Headers describing a body that is dropped on a method change.
const BODY_HEADERS: [&str; 4] = [
    "content-type",
    "content-length",
    "content-encoding",
    "content-language",
];

pub struct RedirectMiddleware {
    max_redirections: usize,
}

impl RedirectMiddleware {
    /// `max_redirections == 0` disables following; redirect responses are
    /// returned as they are.
    pub fn new(max_redirections: usize) -> Self {
        Self { max_redirections }
    }
}

impl Default for RedirectMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REDIRECTIONS)
    }
}

#[async_trait]
impl Middleware for RedirectMiddleware {
    async fn attempt(&self, request: Request, next: Next<'_>) -> Result<Response, DispatchError> {
        if self.max_redirections == 0 {
            return next.run(request).await;
        }

        let mut request = request;
        let mut hops = 0usize;
        loop {
            let mut response = next.run(request.clone()).await?;
            let location = match redirect_location(&response) {
                Some(loc) => loc.to_string(),
                None => {
                    response.redirected = hops > 0;
                    return Ok(response);
                }
            };
            if hops >= self.max_redirections {
                return Err(DispatchError::TooManyRedirects {
                    max: self.max_redirections,
                    url: response.url,
                });
            }

            let target = match response.url.join(&location) {
                Ok(target) if is_http_url(&target) => target,
                _ => {
                    return Err(DispatchError::InvalidRedirect {
                        location,
                        url: response.url,
                    })
                }
            };
            hops += 1;
            tracing::debug!(
                from = %request.url,
                to = %target,
                status = response.status,
                hop = hops,
                "following redirect"
            );
            request = follow(request, response.status, target);
        }
    }
}

fn redirect_location(response: &Response) -> Option<&str> {
    if !REDIRECT_STATUSES.contains(&response.status) {
        return None;
    }
    response.header("location").filter(|l| !l.trim().is_empty())
}

/// Request for the next hop: method rewrite per status, credentials dropped
/// across origins.
fn follow(mut request: Request, status: u16, target: Url) -> Request {
    let switch_to_get = match status {
        303 => request.method != Method::Head,
        301 | 302 => request.method == Method::Post,
        _ => false,
    };
    if switch_to_get {
        request.method = Method::Get;
        request.body = None;
        for name in BODY_HEADERS {
            request.headers.remove(name);
        }
    }
    if request.url.origin() != target.origin() {
        for name in CREDENTIAL_HEADERS {
            request.headers.remove(name);
        }
    }
    request.headers.remove("host");
    request.url = target;
    request
}
