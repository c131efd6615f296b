//! Terminal handlers and the structural classification of their result.
//!
//! A handler is anything implementing [`Handler`]. Plain functions of the
//! shape below implement it automatically:
//!
//! ```
//! use faas_http::prelude::*;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Greeting {
//!     message: String,
//! }
//!
//! fn hello(ctx: &mut Context<Empty, Greeting>) -> BoxFuture<'_, Result<(), Error>> {
//!     Box::pin(async move {
//!         let name = ctx.request.query().string_or("name", "world").to_string();
//!         ctx.response.json(&Greeting {
//!             message: format!("hello, {name}"),
//!         });
//!         Ok(())
//!     })
//! }
//!
//! let chain = Chain::new(hello);
//! # let _ = chain;
//! ```

use std::future::Future;
use std::pin::Pin;

use faas_http_core::Error;

use crate::context::Context;
use crate::response::Response;

/// Type alias for a boxed future returning a result.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The innermost callable of a chain: the application's request logic.
pub trait Handler<Req, Resp>: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut Context<Req, Resp>) -> BoxFuture<'a, Result<(), Error>>;
}

impl<Req, Resp, F> Handler<Req, Resp> for F
where
    F: for<'a> Fn(&'a mut Context<Req, Resp>) -> BoxFuture<'a, Result<(), Error>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut Context<Req, Resp>) -> BoxFuture<'a, Result<(), Error>> {
        self(ctx)
    }
}

/// How a finished call ended.
///
/// A handler error takes precedence over a deferred response error; the
/// latter only surfaces when the handler itself reported success.
#[derive(Debug)]
pub enum Outcome {
    Ok,
    /// The chain returned an error.
    HandlerFailed(Error),
    /// The chain succeeded but a body write on the response failed.
    ResponseFailed(Error),
}

impl Outcome {
    /// Classify a chain result against the response it built, taking any
    /// deferred error off the response.
    pub fn classify<Resp>(result: Result<(), Error>, response: &mut Response<Resp>) -> Self {
        let deferred = response.take_error();
        match (result, deferred) {
            (Err(err), Some(deferred)) => {
                tracing::warn!(
                    error = %deferred,
                    "handler failed; discarding deferred response error"
                );
                Outcome::HandlerFailed(err)
            }
            (Err(err), None) => Outcome::HandlerFailed(err),
            (Ok(()), Some(deferred)) => {
                tracing::warn!(error = %deferred, "response carries a deferred error");
                Outcome::ResponseFailed(deferred)
            }
            (Ok(()), None) => Outcome::Ok,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Ok => None,
            Outcome::HandlerFailed(err) | Outcome::ResponseFailed(err) => Some(err),
        }
    }

    pub fn into_error(self) -> Option<Error> {
        match self {
            Outcome::Ok => None,
            Outcome::HandlerFailed(err) | Outcome::ResponseFailed(err) => Some(err),
        }
    }
}
