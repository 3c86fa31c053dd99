//! HTTP(S) proxy detection from the process environment.
//!
//! Only the conventional `*_proxy` / `no_proxy` variables are honored; lower
//! case wins over upper case, as curl and most tools do.

use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    http: Option<String>,
    https: Option<String>,
    no_proxy: Vec<String>,
}

impl ProxyConfig {
    /// No proxy for any URL.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let cfg = Self::from_lookup(|name| std::env::var(name).ok());
        if cfg.http.is_some() || cfg.https.is_some() {
            tracing::debug!(
                http = cfg.http.as_deref().unwrap_or("-"),
                https = cfg.https.as_deref().unwrap_or("-"),
                no_proxy = cfg.no_proxy.len(),
                "proxy detected from environment"
            );
        }
        cfg
    }

    /// Build from an arbitrary variable source (tests pass a map here).
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            get(&name.to_ascii_lowercase())
                .or_else(|| get(&name.to_ascii_uppercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let all = var("all_proxy");
        let http = var("http_proxy").or_else(|| all.clone());
        let https = var("https_proxy").or(all);
        let no_proxy = var("no_proxy")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            http,
            https,
            no_proxy,
        }
    }

    /// Proxy URL to use for `url`, if any.
    pub fn for_url(&self, url: &Url) -> Option<&str> {
        let proxy = match url.scheme() {
            "https" => self.https.as_deref(),
            "http" => self.http.as_deref(),
            _ => None,
        }?;
        let host = url.host_str()?.trim_start_matches('[').trim_end_matches(']');
        if self.bypasses(&host.to_ascii_lowercase()) {
            return None;
        }
        Some(proxy)
    }

    fn bypasses(&self, host: &str) -> bool {
        self.no_proxy.iter().any(|entry| {
            entry == "*"
                || host == entry
                || (host.len() > entry.len()
                    && host.ends_with(entry.as_str())
                    && host.as_bytes()[host.len() - entry.len() - 1] == b'.')
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(vars: &[(&str, &str)]) -> ProxyConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProxyConfig::from_lookup(|k| map.get(k).cloned())
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn picks_proxy_by_scheme() {
        let c = cfg(&[
            ("http_proxy", "http://p1:3128"),
            ("HTTPS_PROXY", "http://p2:3128"),
        ]);
        assert_eq!(c.for_url(&url("http://a.test/")), Some("http://p1:3128"));
        assert_eq!(c.for_url(&url("https://a.test/")), Some("http://p2:3128"));
    }

    #[test]
    fn lower_case_wins_and_all_proxy_is_fallback() {
        let c = cfg(&[
            ("https_proxy", "http://lower:1"),
            ("HTTPS_PROXY", "http://upper:1"),
            ("ALL_PROXY", "socks5h://all:1080"),
        ]);
        assert_eq!(c.for_url(&url("https://a.test/")), Some("http://lower:1"));
        assert_eq!(c.for_url(&url("http://a.test/")), Some("socks5h://all:1080"));
    }

    #[test]
    fn no_proxy_matches_exact_and_suffix() {
        let c = cfg(&[
            ("https_proxy", "http://p:1"),
            ("no_proxy", "localhost, .internal.test,example.org"),
        ]);
        assert_eq!(c.for_url(&url("https://localhost/")), None);
        assert_eq!(c.for_url(&url("https://svc.internal.test/")), None);
        assert_eq!(c.for_url(&url("https://internal.test/")), None);
        assert_eq!(c.for_url(&url("https://cdn.example.org/")), None);
        assert_eq!(c.for_url(&url("https://notexample.org/")), Some("http://p:1"));
    }

    #[test]
    fn no_proxy_wildcard_disables_everything() {
        let c = cfg(&[("https_proxy", "http://p:1"), ("NO_PROXY", "*")]);
        assert_eq!(c.for_url(&url("https://a.test/")), None);
    }

    #[test]
    fn empty_environment_means_no_proxy() {
        let c = cfg(&[]);
        assert_eq!(c, ProxyConfig::none());
        assert_eq!(c.for_url(&url("https://a.test/")), None);
    }
}
