//! Live lookups through hickory's async resolver.

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use tokio::time::Instant;

use super::{DnsError, Lookup, ResolvedAddrs};

pub struct HickoryLookup {
    resolver: TokioAsyncResolver,
}

impl HickoryLookup {
    /// Resolver built from `/etc/resolv.conf`, or the default upstreams when
    /// the system configuration cannot be read.
    pub fn from_system_conf() -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("system resolver config unavailable ({}), using defaults", e);
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
            }
        };
        Self { resolver }
    }
}

#[async_trait]
impl Lookup for HickoryLookup {
    async fn lookup_ip(&self, host: &str) -> Result<ResolvedAddrs, DnsError> {
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| DnsError::new(host, e.to_string()))?;
        let valid_until = Instant::from_std(lookup.valid_until());
        let addrs = lookup.iter().collect();
        Ok(ResolvedAddrs { addrs, valid_until })
    }
}
