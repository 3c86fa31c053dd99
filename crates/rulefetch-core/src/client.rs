//! Explicitly constructed HTTP client: owns the resolver cache and the
//! middleware chain (retry -> redirect -> transport).

use std::sync::Arc;

use crate::config::FetchConfig;
use crate::dispatch::Dispatcher;
use crate::dns::{DnsCache, HickoryLookup};
use crate::error::DispatchError;
use crate::proxy::ProxyConfig;
use crate::redirect::{RedirectMiddleware, DEFAULT_MAX_REDIRECTIONS};
use crate::request::{Request, Response};
use crate::retry::{RetryMiddleware, RetryOptions};
use crate::transport::{CurlOptions, CurlTransport, Transport};

pub struct HttpClient {
    dispatcher: Dispatcher,
    dns: Option<Arc<DnsCache>>,
}

impl HttpClient {
    /// Production stack: hickory resolver cache, environment proxy, curl.
    pub fn from_config(config: &FetchConfig) -> Self {
        let dns = Arc::new(
            DnsCache::new(HickoryLookup::from_system_conf()).with_max_ttl(config.dns_max_ttl()),
        );
        let transport = CurlTransport::new(
            Arc::clone(&dns),
            ProxyConfig::from_env(),
            config.curl_options(),
        );
        HttpClient::builder(Arc::new(transport))
            .dns(dns)
            .retry(config.retry_options())
            .max_redirections(config.max_redirections)
            .build()
    }

    /// Curl transport over a caller-supplied resolver cache and proxy setup.
    pub fn with_curl(
        dns: Arc<DnsCache>,
        proxy: ProxyConfig,
        curl: CurlOptions,
    ) -> HttpClientBuilder {
        let transport = CurlTransport::new(Arc::clone(&dns), proxy, curl);
        HttpClient::builder(Arc::new(transport)).dns(dns)
    }

    pub fn builder(transport: Arc<dyn Transport>) -> HttpClientBuilder {
        HttpClientBuilder {
            transport,
            dns: None,
            retry: RetryOptions::system_default(),
            max_redirections: DEFAULT_MAX_REDIRECTIONS,
        }
    }

    /// Resolver cache used by the transport, when it has one.
    pub fn dns(&self) -> Option<&Arc<DnsCache>> {
        self.dns.as_ref()
    }

    /// Run a request through the whole chain. Non-success statuses are
    /// returned as responses; see [`crate::fetch_with_log`] for the
    /// error-normalizing entry point.
    pub async fn dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        self.dispatcher.dispatch(request).await
    }
}

pub struct HttpClientBuilder {
    transport: Arc<dyn Transport>,
    dns: Option<Arc<DnsCache>>,
    retry: RetryOptions,
    max_redirections: usize,
}

impl HttpClientBuilder {
    pub fn dns(mut self, dns: Arc<DnsCache>) -> Self {
        self.dns = Some(dns);
        self
    }

    pub fn retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    pub fn max_redirections(mut self, max: usize) -> Self {
        self.max_redirections = max;
        self
    }

    pub fn build(self) -> HttpClient {
        let dispatcher = Dispatcher::new(self.transport)
            .with(RetryMiddleware::new(self.retry))
            .with(RedirectMiddleware::new(self.max_redirections));
        HttpClient {
            dispatcher,
            dns: self.dns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::HickoryLookup;
    use crate::transport::{TransportError, TransportErrorKind};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn send(&self, _request: &Request) -> Result<Response, TransportError> {
            Err(TransportError::new(TransportErrorKind::Other, "unused"))
        }
    }

    #[tokio::test]
    async fn curl_client_exposes_its_resolver_cache() {
        let dns = Arc::new(DnsCache::new(HickoryLookup::from_system_conf()));
        let client =
            HttpClient::with_curl(Arc::clone(&dns), ProxyConfig::none(), CurlOptions::default())
                .build();
        let shared = client.dns().unwrap();
        assert!(Arc::ptr_eq(shared, &dns));

        // Literals resolve without touching the network.
        let addrs = shared
            .lookup("127.0.0.1", crate::dns::LookupOptions::default())
            .await
            .unwrap();
        assert_eq!(addrs.len(), 1);
    }

    #[test]
    fn custom_transport_has_no_cache_unless_given_one() {
        let client = HttpClient::builder(Arc::new(Unreachable)).build();
        assert!(client.dns().is_none());
    }
}
