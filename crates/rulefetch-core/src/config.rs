use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::DEFAULT_USER_AGENT;
use crate::redirect::DEFAULT_MAX_REDIRECTIONS;
use crate::request::Method;
use crate::retry::RetryOptions;
use crate::transport::CurlOptions;

/// Retry parameters (optional `[retry]` section in config.toml).
/// Missing keys fall back to the system defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff step in milliseconds.
    pub min_timeout_ms: u64,
    /// Upper bound on any backoff delay in milliseconds.
    pub max_timeout_ms: u64,
    /// Growth factor between backoff steps.
    pub timeout_factor: f64,
    /// Methods that may be retried.
    pub methods: Vec<Method>,
    /// Response statuses treated as a retry signal.
    pub status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig::from(&RetryOptions::system_default())
    }
}

impl From<&RetryOptions> for RetryConfig {
    fn from(o: &RetryOptions) -> Self {
        Self {
            max_retries: o.max_retries,
            min_timeout_ms: o.min_timeout.as_millis() as u64,
            max_timeout_ms: o.max_timeout.as_millis() as u64,
            timeout_factor: o.timeout_factor,
            methods: o.methods.clone(),
            status_codes: o.status_codes.clone(),
        }
    }
}

impl From<&RetryConfig> for RetryOptions {
    fn from(c: &RetryConfig) -> Self {
        Self {
            max_retries: c.max_retries,
            min_timeout: Duration::from_millis(c.min_timeout_ms),
            max_timeout: Duration::from_millis(c.max_timeout_ms),
            timeout_factor: c.timeout_factor,
            methods: c.methods.clone(),
            status_codes: c.status_codes.clone(),
        }
    }
}

/// Global configuration loaded from `~/.config/rulefetch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Redirect hops followed per attempt (0 = do not follow).
    pub max_redirections: usize,
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout per attempt.
    pub request_timeout_secs: u64,
    /// Optional cap on how long a DNS answer is cached, below its record TTL.
    #[serde(default)]
    pub dns_max_ttl_secs: Option<u64>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let curl = CurlOptions::default();
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirections: DEFAULT_MAX_REDIRECTIONS,
            connect_timeout_secs: curl.connect_timeout.as_secs(),
            request_timeout_secs: curl.timeout.as_secs(),
            dns_max_ttl_secs: None,
            retry: None,
        }
    }
}

impl FetchConfig {
    pub fn retry_options(&self) -> RetryOptions {
        self.retry
            .as_ref()
            .map(RetryOptions::from)
            .unwrap_or_else(RetryOptions::system_default)
    }

    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn dns_max_ttl(&self) -> Option<Duration> {
        self.dns_max_ttl_secs.map(Duration::from_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rulefetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<FetchConfig> {
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: FetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
