use rulefetch_core::logging::{self, LogTarget};

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    match logging::init() {
        LogTarget::File(path) => tracing::debug!("log file: {}", path.display()),
        LogTarget::Stderr => tracing::debug!("logging to stderr"),
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("rulefetch error: {:#}", err);
        std::process::exit(1);
    }
}
