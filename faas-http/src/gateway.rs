//! Gateway adapter: runs one chain behind the v1 and v2 function triggers.
//!
//! The host's invocation loop stays outside this crate. It hands each event
//! to [`Adapter::invoke_v1`] or [`Adapter::invoke_v2`] and writes back the
//! returned envelope.
//!
//! ```no_run
//! use faas_http::prelude::*;
//! use faas_http::gateway::v2;
//!
//! fn handler(ctx: &mut Context<Empty, Empty>) -> BoxFuture<'_, Result<(), Error>> {
//!     Box::pin(async move {
//!         ctx.response.send_string("pong");
//!         Ok(())
//!     })
//! }
//!
//! # async fn run(event: v2::HttpRequest) -> Result<(), Box<dyn std::error::Error>> {
//! let adapter = Adapter::builder(handler).start().await?;
//! let reply = adapter.invoke_v2(Invocation::new("req-1"), event).await?;
//! assert_eq!(reply.status_code, 200);
//! # Ok(())
//! # }
//! ```

pub mod v1;
pub mod v2;

use std::sync::Arc;
use std::time::Duration;

use faas_http_core::Error;
use http::Method;
use serde::de::DeserializeOwned;

use crate::config::{AdapterConfig, Resource, StartError};
use crate::context::{Context, Invocation};
use crate::handler::{Handler, Outcome};
use crate::middleware::{Chain, Middleware};
use crate::pipeline::{ErrorHandler, ErrorResponse, RequestPipeline, ResponsePipeline};
use crate::request::RequestBuilder;
use crate::response::Parts;

/// A started adapter, ready for invocations.
pub struct Adapter<Req, Resp> {
    chain: Chain<Req, Resp>,
    config: AdapterConfig,
}

impl<Req, Resp> Adapter<Req, Resp>
where
    Req: DeserializeOwned + Default + Send + 'static,
    Resp: Send + 'static,
{
    /// Start configuring an adapter around `handler`.
    pub fn builder<H>(handler: H) -> AdapterBuilder<Req, Resp>
    where
        H: Handler<Req, Resp> + 'static,
    {
        AdapterBuilder {
            chain: Chain::new(handler),
            config: AdapterConfig::default(),
        }
    }

    /// Run one call through decode, the chain and the error pipeline.
    ///
    /// Returns `Err` only when the error handler itself fails.
    pub(crate) async fn dispatch(
        &self,
        invocation: Invocation,
        request: Result<RequestBuilder, Error>,
        body: &str,
        is_base64: bool,
    ) -> Result<Parts, Error> {
        let on_error = &self.config.error_handler;

        let request = match request {
            Ok(request) => request,
            Err(err) => return ResponsePipeline::reject(&err, on_error),
        };
        let method = request.method_ref().clone();
        let body = match RequestPipeline::decode::<Req>(&method, body, is_base64) {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(
                    request_id = invocation.request_id(),
                    error = %err,
                    "request body rejected"
                );
                return ResponsePipeline::reject(&err, on_error);
            }
        };

        let mut ctx = Context::new(request.body(body), invocation);
        let result = self.chain.call(&mut ctx).await;
        let outcome = Outcome::classify(result, &mut ctx.response);
        ResponsePipeline::finish(outcome, ctx.response, on_error)
    }
}

impl<Req, Resp> std::fmt::Debug for Adapter<Req, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("chain", &self.chain)
            .field("config", &self.config)
            .finish()
    }
}

/// Options for an [`Adapter`].
pub struct AdapterBuilder<Req, Resp> {
    chain: Chain<Req, Resp>,
    config: AdapterConfig,
}

impl<Req, Resp> AdapterBuilder<Req, Resp>
where
    Req: DeserializeOwned + Default + Send + 'static,
    Resp: Send + 'static,
{
    /// Register resources to start before the first invocation.
    pub fn with_resources<I, R>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Resource + 'static,
    {
        self.config
            .resources
            .extend(resources.into_iter().map(|r| Arc::new(r) as Arc<dyn Resource>));
        self
    }

    /// Register an already-shared resource.
    pub fn with_resource(mut self, resource: Arc<dyn Resource>) -> Self {
        self.config.resources.push(resource);
        self
    }

    /// Give resource start-up a deadline, shared by every resource.
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.config.start_timeout = Some(timeout);
        self
    }

    /// Replace the default error resolution.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Error) -> Result<ErrorResponse, Error> + Send + Sync + 'static,
    {
        self.config.error_handler = ErrorHandler::new(handler);
        self
    }

    /// Wrap the handler in another middleware, inside those already added.
    pub fn with_middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<Req, Resp> + 'static,
    {
        self.chain = self.chain.with(middleware);
        self
    }

    /// Start every resource in order and return the adapter.
    ///
    /// The first resource failure aborts bring-up.
    pub async fn start(self) -> Result<Adapter<Req, Resp>, StartError> {
        self.config.start_resources().await?;
        tracing::info!(middleware = self.chain.len(), "adapter ready");
        Ok(Adapter {
            chain: self.chain,
            config: self.config,
        })
    }
}

/// Parse a gateway method string.
pub(crate) fn parse_method(method: &str) -> Result<Method, Error> {
    Method::from_bytes(method.as_bytes())
        .map_err(|err| Error::new(err).wrap(format!("invalid HTTP method {method:?}")))
}
