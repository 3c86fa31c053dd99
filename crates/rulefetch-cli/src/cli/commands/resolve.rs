//! Resolve command: print the addresses the client's resolver cache hands out.

use anyhow::{Context, Result};
use rulefetch_core::config::FetchConfig;
use rulefetch_core::dns::{AddrFamily, LookupOptions};
use rulefetch_core::HttpClient;

pub async fn run_resolve(cfg: &FetchConfig, host: &str, family: AddrFamily) -> Result<()> {
    let client = HttpClient::from_config(cfg);
    let cache = client
        .dns()
        .context("client was built without a resolver cache")?;
    let addrs = cache
        .lookup(host, LookupOptions { family })
        .await
        .with_context(|| format!("resolve {}", host))?;
    for addr in addrs {
        println!("{}", addr);
    }
    Ok(())
}
