//! CLI command handlers, one file per command.

pub(super) mod fetch;
mod resolve;

pub use fetch::{run_fetch, FetchArgs};
pub use resolve::run_resolve;
