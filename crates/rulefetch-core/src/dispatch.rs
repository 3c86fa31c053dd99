//! Middleware chain in front of the transport.
//!
//! The chain is fixed when the [`Dispatcher`] is built. A request enters the
//! first middleware, which decides when (and how often) to hand it to the
//! rest of the chain through [`Next`]; the last link is the transport.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::DispatchError;
use crate::request::{Request, Response};
use crate::transport::Transport;

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn attempt(&self, request: Request, next: Next<'_>) -> Result<Response, DispatchError>;
}

/// Cursor over the remainder of the chain. `Copy`, so a middleware can run
/// the rest of the chain more than once (retries, redirect hops).
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub async fn run(self, request: Request) -> Result<Response, DispatchError> {
        match self.chain.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    chain: rest,
                    transport: self.transport,
                };
                head.attempt(request, next).await
            }
            None => Ok(self.transport.send(&request).await?),
        }
    }
}

pub struct Dispatcher {
    chain: Vec<Arc<dyn Middleware>>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            chain: Vec::new(),
            transport,
        }
    }

    /// Append a middleware; earlier ones wrap later ones.
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.chain.push(Arc::new(middleware));
        self
    }

    pub async fn dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        let next = Next {
            chain: &self.chain,
            transport: self.transport.as_ref(),
        };
        next.run(request).await
    }
}
