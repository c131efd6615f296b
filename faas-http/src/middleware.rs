//! Onion-model middleware composition.
//!
//! A [`Middleware`] receives the context and a [`Next`] cursor over the rest
//! of the chain. Calling [`Next::run`] continues inward; returning without
//! calling it short-circuits, and every middleware further out still runs
//! its own post-`next` code.
//!
//! ```
//! use faas_http::prelude::*;
//!
//! fn request_id<'a>(
//!     ctx: &'a mut Context<Empty, Empty>,
//!     next: Next<'a, Empty, Empty>,
//! ) -> BoxFuture<'a, Result<(), Error>> {
//!     Box::pin(async move {
//!         let id = ctx.invocation.request_id().to_string();
//!         let result = next.run(ctx).await;
//!         ctx.response.set_header("X-Request-Id", id);
//!         result
//!     })
//! }
//!
//! fn handler(ctx: &mut Context<Empty, Empty>) -> BoxFuture<'_, Result<(), Error>> {
//!     Box::pin(async move {
//!         ctx.response.send_string("ok");
//!         Ok(())
//!     })
//! }
//!
//! let chain = Chain::new(handler).with(request_id);
//! # let _ = chain;
//! ```

use std::fmt;
use std::sync::Arc;

use faas_http_core::Error;

use crate::context::Context;
use crate::handler::{BoxFuture, Handler};

/// A layer around the rest of the chain.
pub trait Middleware<Req, Resp>: Send + Sync {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context<Req, Resp>,
        next: Next<'a, Req, Resp>,
    ) -> BoxFuture<'a, Result<(), Error>>;
}

impl<Req, Resp, F> Middleware<Req, Resp> for F
where
    F: for<'a> Fn(&'a mut Context<Req, Resp>, Next<'a, Req, Resp>) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync,
{
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context<Req, Resp>,
        next: Next<'a, Req, Resp>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        self(ctx, next)
    }
}

// ============================================================================
// Next - cursor over the remaining chain
// ============================================================================

/// The rest of the chain as seen from one middleware.
pub struct Next<'a, Req, Resp> {
    middleware: &'a [Arc<dyn Middleware<Req, Resp>>],
    handler: &'a dyn Handler<Req, Resp>,
}

impl<Req, Resp> Clone for Next<'_, Req, Resp> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Req, Resp> Copy for Next<'_, Req, Resp> {}

impl<'a, Req, Resp> Next<'a, Req, Resp> {
    /// Run the remaining middleware and then the handler.
    ///
    /// The context is reborrowed, so the caller can keep using it once the
    /// returned future completes. Errors come back exactly as the innermost
    /// reached link returned them.
    pub fn run<'b>(self, ctx: &'b mut Context<Req, Resp>) -> BoxFuture<'b, Result<(), Error>>
    where
        'a: 'b,
    {
        match self.middleware.split_first() {
            Some((first, rest)) => first.handle(
                ctx,
                Next {
                    middleware: rest,
                    handler: self.handler,
                },
            ),
            None => self.handler.call(ctx),
        }
    }

    /// Number of middleware still ahead of the handler.
    pub fn remaining(&self) -> usize {
        self.middleware.len()
    }
}

impl<Req, Resp> fmt::Debug for Next<'_, Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Chain - middleware composed around a handler
// ============================================================================

/// Middleware composed around a terminal handler.
///
/// Middleware run in the order they were added on the way in and in reverse
/// order on the way out. A `Chain` is itself a [`Handler`].
pub struct Chain<Req, Resp> {
    middleware: Vec<Arc<dyn Middleware<Req, Resp>>>,
    handler: Arc<dyn Handler<Req, Resp>>,
}

impl<Req, Resp> Chain<Req, Resp> {
    pub fn new<H>(handler: H) -> Self
    where
        H: Handler<Req, Resp> + 'static,
    {
        Self {
            middleware: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Add a middleware inside the ones already added.
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<Req, Resp> + 'static,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Add already-shared middleware, in order.
    pub fn with_all<I>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Middleware<Req, Resp>>>,
    {
        self.middleware.extend(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

impl<Req, Resp> Clone for Chain<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<Req, Resp> fmt::Debug for Chain<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

impl<Req, Resp> Handler<Req, Resp> for Chain<Req, Resp> {
    fn call<'a>(&'a self, ctx: &'a mut Context<Req, Resp>) -> BoxFuture<'a, Result<(), Error>> {
        Next {
            middleware: &self.middleware,
            handler: &*self.handler,
        }
        .run(ctx)
    }
}

/// Compose `middleware` around `handler`, outermost first.
pub fn use_middleware<Req, Resp, H, I>(handler: H, middleware: I) -> Chain<Req, Resp>
where
    H: Handler<Req, Resp> + 'static,
    I: IntoIterator<Item = Arc<dyn Middleware<Req, Resp>>>,
{
    Chain::new(handler).with_all(middleware)
}
