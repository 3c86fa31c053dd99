//! Resolver cache.
//!
//! Caches hostname -> address answers until the DNS records expire and falls
//! back to a live lookup on a miss. Errors from the resolver are passed
//! through unchanged and are never cached; retrying them is the dispatch
//! pipeline's job. Concurrent misses for the same host may each resolve.

mod hickory;

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;

pub use self::hickory::HickoryLookup;

/// Live resolution backend used on a cache miss.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup_ip(&self, host: &str) -> Result<ResolvedAddrs, DnsError>;
}

/// A resolver answer and the instant it stops being valid (lowest record TTL).
#[derive(Debug, Clone)]
pub struct ResolvedAddrs {
    pub addrs: Vec<IpAddr>,
    pub valid_until: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to resolve {host}: {message}")]
pub struct DnsError {
    pub host: String,
    pub message: String,
}

impl DnsError {
    pub fn new(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            message: message.into(),
        }
    }
}

/// Address family filter applied to an answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddrFamily {
    #[default]
    Any,
    V4,
    V6,
}

impl AddrFamily {
    fn accepts(self, ip: &IpAddr) -> bool {
        match self {
            AddrFamily::Any => true,
            AddrFamily::V4 => ip.is_ipv4(),
            AddrFamily::V6 => ip.is_ipv6(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LookupOptions {
    pub family: AddrFamily,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    addrs: Vec<IpAddr>,
    expires_at: Instant,
}

/// Shared hostname -> addresses cache in front of a [`Lookup`].
pub struct DnsCache {
    lookup: Box<dyn Lookup>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Upper bound on how long an answer is served, regardless of its TTL.
    max_ttl: Option<Duration>,
}

impl DnsCache {
    pub fn new(lookup: impl Lookup + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
            entries: RwLock::new(HashMap::new()),
            max_ttl: None,
        }
    }

    pub fn with_max_ttl(mut self, max_ttl: Option<Duration>) -> Self {
        self.max_ttl = max_ttl;
        self
    }

    /// Resolve `host`, serving a cached answer while it is still valid.
    pub async fn lookup(
        &self,
        host: &str,
        options: LookupOptions,
    ) -> Result<Vec<IpAddr>, DnsError> {
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return filter(host, vec![ip], options.family);
        }

        let key = host.to_ascii_lowercase();
        if let Some(addrs) = self.cached(&key) {
            tracing::trace!(host = %key, "dns cache hit");
            return filter(host, addrs, options.family);
        }

        tracing::debug!(host = %key, "dns cache miss, resolving");
        let resolved = self.lookup.lookup_ip(&key).await?;
        let now = Instant::now();
        let expires_at = match self.max_ttl {
            Some(max) => resolved.valid_until.min(now + max),
            None => resolved.valid_until,
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Misses sweep out every expired entry so hosts seen once do not pile up.
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            CacheEntry {
                addrs: resolved.addrs.clone(),
                expires_at,
            },
        );
        drop(entries);
        filter(host, resolved.addrs, options.family)
    }

    fn cached(&self, key: &str) -> Option<Vec<IpAddr>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.addrs.clone())
        } else {
            None
        }
    }

    pub fn evict(&self, host: &str) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&host.to_ascii_lowercase());
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Number of entries. Expired ones count until the next miss sweeps them.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn filter(host: &str, addrs: Vec<IpAddr>, family: AddrFamily) -> Result<Vec<IpAddr>, DnsError> {
    let addrs: Vec<IpAddr> = addrs.into_iter().filter(|ip| family.accepts(ip)).collect();
    if addrs.is_empty() {
        return Err(DnsError::new(host, format!("no {:?} addresses", family)));
    }
    Ok(addrs)
}
