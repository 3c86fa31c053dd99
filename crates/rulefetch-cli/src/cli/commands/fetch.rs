//! Fetch command: one request through the full client, Ctrl-C aborts it.

use anyhow::{bail, Context, Result};
use rulefetch_core::config::FetchConfig;
use rulefetch_core::{fetch_with_log, FetchOptions, HttpClient, Method};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct FetchArgs {
    pub url: String,
    pub output: Option<PathBuf>,
    pub headers: Vec<String>,
    pub method: Method,
    pub max_retries: Option<u32>,
    pub min_timeout_ms: Option<u64>,
}

/// Split a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = match raw.split_once(':') {
        Some(parts) => parts,
        None => bail!("header {:?} is not in `Name: value` form", raw),
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header {:?} has an empty name", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

pub async fn run_fetch(cfg: &FetchConfig, args: FetchArgs) -> Result<()> {
    let client = HttpClient::from_config(cfg);

    let mut retry = cfg.retry_options();
    if let Some(n) = args.max_retries {
        retry.max_retries = n;
    }
    if let Some(ms) = args.min_timeout_ms {
        retry.min_timeout = Duration::from_millis(ms);
    }

    let cancel = CancellationToken::new();
    let mut options = FetchOptions::default()
        .method(args.method)
        .retry(retry)
        .cancel(cancel.clone());
    if !cfg.user_agent.is_empty() {
        options = options.header("User-Agent", cfg.user_agent.clone());
    }
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        options = options.header(name, value);
    }

    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, aborting fetch");
                cancel.cancel();
            }
        })
    };

    let result = fetch_with_log(&client, args.url.as_str(), options).await;
    ctrl_c.abort();
    let response = result.with_context(|| format!("fetch {}", args.url))?;

    tracing::info!(
        status = response.status,
        bytes = response.body.len(),
        redirected = response.redirected,
        "fetched {}",
        response.url
    );

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &response.body)
                .await
                .with_context(|| format!("write {}", path.display()))?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&response.body).await?;
            stdout.flush().await?;
        }
    }
    eprintln!(
        "{} {} ({} bytes)",
        response.status,
        response.url,
        response.body.len()
    );
    Ok(())
}
