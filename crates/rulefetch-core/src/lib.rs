pub mod config;
pub mod logging;

pub mod client;
pub mod dispatch;
pub mod dns;
pub mod error;
pub mod fetch;
pub mod proxy;
pub mod redirect;
pub mod request;
pub mod retry;
pub mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use error::{DispatchError, FetchError, FetchFailure, UrlError};
pub use fetch::{fetch_with_log, FetchOptions, IntoUrl, DEFAULT_USER_AGENT};
pub use request::{HeaderList, Method, Request, Response};
