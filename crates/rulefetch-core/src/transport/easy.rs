//! libcurl transport: one easy handle per physical attempt.
//!
//! The transfer runs on the blocking pool. Host names are resolved through the
//! shared [`DnsCache`] and pinned with `CURLOPT_RESOLVE`, so curl never does
//! its own lookup for direct connections.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::IpAddr;
use std::str;
use std::sync::Arc;
use std::time::Duration;
use url::{Host, Url};

use super::classify::classify_curl_error;
use super::parse::parse_head;
use super::{Transport, TransportError, TransportErrorKind};
use crate::dns::{DnsCache, LookupOptions};
use crate::proxy::ProxyConfig;
use crate::request::{is_http_url, Method, Request, Response};

/// Per-attempt curl limits.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Whole-transfer timeout.
    pub timeout: Duration,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(300),
        }
    }
}

pub struct CurlTransport {
    dns: Arc<DnsCache>,
    proxy: ProxyConfig,
    options: CurlOptions,
}

impl CurlTransport {
    pub fn new(dns: Arc<DnsCache>, proxy: ProxyConfig, options: CurlOptions) -> Self {
        Self {
            dns,
            proxy,
            options,
        }
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn send(&self, request: &Request) -> Result<Response, TransportError> {
        if request.cancel.is_cancelled() {
            return Err(TransportError::new(TransportErrorKind::Abort, "request cancelled"));
        }
        if !is_http_url(&request.url) {
            return Err(TransportError::new(
                TransportErrorKind::Escaping,
                format!("refusing non-HTTP URL {}", request.url),
            ));
        }
        check_headers(request)?;

        let proxy = self.proxy.for_url(&request.url).map(str::to_string);
        // A proxy resolves the target itself.
        let resolve = match (&proxy, request.url.host()) {
            (None, Some(Host::Domain(host))) => {
                let port = request.url.port_or_known_default().unwrap_or(80);
                let addrs = self.dns.lookup(host, LookupOptions::default()).await?;
                Some(resolve_entry(host, port, &addrs))
            }
            _ => None,
        };

        let request = request.clone();
        let options = self.options;
        tokio::task::spawn_blocking(move || {
            perform(&request, resolve.as_deref(), proxy.as_deref(), options)
        })
        .await
        .map_err(|e| {
            TransportError::new(TransportErrorKind::Other, format!("transport task join: {}", e))
        })?
    }
}

fn curl_error(e: curl::Error) -> TransportError {
    TransportError::new(classify_curl_error(&e), e.to_string())
}

/// `host:port:addr[,addr...]` as `CURLOPT_RESOLVE` expects it.
fn resolve_entry(host: &str, port: u16, addrs: &[IpAddr]) -> String {
    let addrs: Vec<String> = addrs
        .iter()
        .map(|ip| match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{}]", v6),
        })
        .collect();
    format!("{}:{}:{}", host, port, addrs.join(","))
}

/// Reject header fields that would split or corrupt the request head.
fn check_headers(request: &Request) -> Result<(), TransportError> {
    for (name, value) in request.headers.iter() {
        let bad_name = name.is_empty()
            || name
                .bytes()
                .any(|b| b == b':' || b.is_ascii_whitespace() || b.is_ascii_control());
        let bad_value = value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0);
        if bad_name || bad_value {
            return Err(TransportError::new(
                TransportErrorKind::Escaping,
                format!("invalid characters in header {:?}", name),
            ));
        }
    }
    Ok(())
}

fn perform(
    request: &Request,
    resolve: Option<&str>,
    proxy: Option<&str>,
    options: CurlOptions,
) -> Result<Response, TransportError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(request.url.as_str()).map_err(curl_error)?;

    let body = request.body.as_deref().unwrap_or(&[]);
    match request.method {
        Method::Get => easy.get(true).map_err(curl_error)?,
        Method::Head => easy.nobody(true).map_err(curl_error)?,
        Method::Post => easy.post_fields_copy(body).map_err(curl_error)?,
        other => {
            easy.custom_request(other.as_str()).map_err(curl_error)?;
            if !body.is_empty() {
                easy.post_fields_copy(body).map_err(curl_error)?;
            }
        }
    }

    // Redirects are the redirect middleware's job.
    easy.follow_location(false).map_err(curl_error)?;
    easy.connect_timeout(options.connect_timeout)
        .map_err(curl_error)?;
    easy.timeout(options.timeout).map_err(curl_error)?;
    // Empty string disables curl's own environment proxy lookup.
    easy.proxy(proxy.unwrap_or("")).map_err(curl_error)?;

    if let Some(entry) = resolve {
        let mut list = curl::easy::List::new();
        list.append(entry).map_err(curl_error)?;
        easy.resolve(list).map_err(curl_error)?;
    }

    let mut list = curl::easy::List::new();
    for (name, value) in request.headers.iter() {
        // "Name;" is curl's spelling for a header with an empty value.
        let line = if value.is_empty() {
            format!("{};", name)
        } else {
            format!("{}: {}", name, value)
        };
        list.append(&line).map_err(curl_error)?;
    }
    if !request.headers.is_empty() {
        easy.http_headers(list).map_err(curl_error)?;
    }
    easy.progress(true).map_err(curl_error)?;

    let mut head_lines: Vec<String> = Vec::new();
    let mut body_buf: Vec<u8> = Vec::new();
    let cancel = request.cancel.clone();
    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    head_lines.push(s.to_string());
                }
                true
            })
            .map_err(curl_error)?;
        transfer
            .write_function(|data| {
                body_buf.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(curl_error)?;
        // Returning false aborts the transfer (CURLE_ABORTED_BY_CALLBACK).
        transfer
            .progress_function(|_, _, _, _| !cancel.is_cancelled())
            .map_err(curl_error)?;
        transfer.perform().map_err(curl_error)?;
    }

    let status = easy.response_code().map_err(curl_error)?;
    let url = easy
        .effective_url()
        .ok()
        .flatten()
        .and_then(|u| Url::parse(u).ok())
        .unwrap_or_else(|| request.url.clone());
    let head = parse_head(&head_lines);
    tracing::trace!(%url, status, bytes = body_buf.len(), "transfer complete");

    Ok(Response {
        status: status as u16,
        status_text: head.status_text,
        url,
        headers: head.headers,
        body: Bytes::from(body_buf),
        redirected: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_entry_brackets_ipv6() {
        let addrs: Vec<IpAddr> = vec![
            "192.0.2.7".parse().unwrap(),
            "2001:db8::7".parse().unwrap(),
        ];
        assert_eq!(
            resolve_entry("example.com", 443, &addrs),
            "example.com:443:192.0.2.7,[2001:db8::7]"
        );
    }

    #[test]
    fn header_injection_is_an_escaping_error() {
        let mut req = Request::get(Url::parse("http://example.com/").unwrap());
        req.headers.insert("X-Test", "ok\r\nInjected: 1");
        let err = check_headers(&req).unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Escaping);

        let mut req = Request::get(Url::parse("http://example.com/").unwrap());
        req.headers.insert("Bad Name", "v");
        assert_eq!(check_headers(&req).unwrap_err().kind, TransportErrorKind::Escaping);
    }

    #[tokio::test]
    async fn non_http_urls_never_reach_curl() {
        let dns = Arc::new(DnsCache::new(crate::dns::HickoryLookup::from_system_conf()));
        let transport = CurlTransport::new(dns, ProxyConfig::none(), CurlOptions::default());
        for raw in ["file:///etc/hostname", "dict://localhost:2628/d:x", "ftp://a.test/"] {
            let req = Request::get(Url::parse(raw).unwrap());
            let err = transport.send(&req).await.unwrap_err();
            assert_eq!(err.kind, TransportErrorKind::Escaping, "{}", raw);
        }
    }

    #[test]
    fn ordinary_headers_pass() {
        let mut req = Request::get(Url::parse("http://example.com/").unwrap());
        req.headers.insert("User-Agent", "rulefetch/0.1");
        req.headers.insert("If-None-Match", "\"abc\"");
        assert!(check_headers(&req).is_ok());
    }
}
