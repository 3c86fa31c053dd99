//! CLI for the rulefetch HTTP fetch layer.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rulefetch_core::config;
use rulefetch_core::dns::AddrFamily;
use rulefetch_core::Method;
use std::path::PathBuf;

use commands::{run_fetch, run_resolve, FetchArgs};

/// Top-level CLI for rulefetch.
#[derive(Debug, Parser)]
#[command(name = "rulefetch")]
#[command(
    about = "rulefetch: resilient HTTP fetches with DNS caching, retries and redirects",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a URL and write the body to a file or stdout.
    Fetch {
        /// HTTP/HTTPS URL to fetch.
        url: String,

        /// Write the body here instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Extra request header, `Name: value`. Repeatable.
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        header: Vec<String>,

        /// Request method.
        #[arg(short = 'X', long, default_value = "GET")]
        method: Method,

        /// Override the configured retry count.
        #[arg(long, value_name = "N")]
        max_retries: Option<u32>,

        /// Override the configured first backoff delay.
        #[arg(long, value_name = "MS")]
        min_timeout_ms: Option<u64>,
    },

    /// Resolve a host name through the caching resolver.
    Resolve {
        /// Host name or IP literal.
        host: String,

        /// Address family to keep.
        #[arg(long, value_enum, default_value_t = FamilyArg::Any)]
        family: FamilyArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FamilyArg {
    Any,
    V4,
    V6,
}

impl From<FamilyArg> for AddrFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Any => AddrFamily::Any,
            FamilyArg::V4 => AddrFamily::V4,
            FamilyArg::V6 => AddrFamily::V6,
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch {
                url,
                output,
                header,
                method,
                max_retries,
                min_timeout_ms,
            } => {
                let args = FetchArgs {
                    url,
                    output,
                    headers: header,
                    method,
                    max_retries,
                    min_timeout_ms,
                };
                run_fetch(&cfg, args).await?
            }
            CliCommand::Resolve { host, family } => run_resolve(&cfg, &host, family.into()).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
