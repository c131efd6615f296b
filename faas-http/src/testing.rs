//! Run handlers in tests without a gateway envelope.
//!
//! ```
//! use faas_http::prelude::*;
//! use faas_http::testing::{self, TestRequest};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Echo {
//!     path: String,
//! }
//!
//! fn echo(ctx: &mut Context<Empty, Echo>) -> BoxFuture<'_, Result<(), Error>> {
//!     Box::pin(async move {
//!         let path = ctx.request.path().to_string();
//!         ctx.response.json(&Echo { path });
//!         Ok(())
//!     })
//! }
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let request = Request::builder().path("/hello").body(Empty {});
//! let ctx = testing::run(&echo, TestRequest::new(request)).await.unwrap();
//! assert_eq!(ctx.response_body().unwrap().path, "/hello");
//! # });
//! # }
//! ```

use std::any::Any;
use std::ops::{Deref, DerefMut};

use faas_http_core::Error;
use serde::de::DeserializeOwned;

use crate::context::{Context, Invocation, Locals};
use crate::handler::{Handler, Outcome};
use crate::request::Request;

/// A request plus the context pieces a test wants to seed.
#[derive(Debug)]
pub struct TestRequest<Req> {
    request: Request<Req>,
    invocation: Invocation,
    locals: Locals,
}

impl<Req> TestRequest<Req> {
    pub fn new(request: Request<Req>) -> Self {
        Self {
            request,
            invocation: Invocation::new("test-invocation"),
            locals: Locals::new(),
        }
    }

    pub fn with_invocation(mut self, invocation: Invocation) -> Self {
        self.invocation = invocation;
        self
    }

    /// Seed a local as if an outer middleware had set it.
    pub fn with_local<V>(mut self, key: impl Into<String>, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        self.locals.set(key, value);
        self
    }
}

impl<Req> From<Request<Req>> for TestRequest<Req> {
    fn from(request: Request<Req>) -> Self {
        Self::new(request)
    }
}

/// The context a handler finished with.
#[derive(Debug)]
pub struct TestContext<Req, Resp> {
    ctx: Context<Req, Resp>,
}

impl<Req, Resp> TestContext<Req, Resp> {
    pub fn into_inner(self) -> Context<Req, Resp> {
        self.ctx
    }
}

impl<Req, Resp: DeserializeOwned> TestContext<Req, Resp> {
    /// Decode the response body as the handler's declared response type.
    pub fn response_body(&self) -> Result<Resp, Error> {
        Ok(serde_json::from_slice(self.ctx.response.body())?)
    }
}

impl<Req, Resp> Deref for TestContext<Req, Resp> {
    type Target = Context<Req, Resp>;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl<Req, Resp> DerefMut for TestContext<Req, Resp> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ctx
    }
}

/// Run `handler` once against `request`.
///
/// Fails with the handler's error, or with the response's deferred error
/// when the handler succeeded. Errors are returned as-is, not resolved into
/// responses.
pub async fn run<Req, Resp, H>(
    handler: &H,
    request: impl Into<TestRequest<Req>>,
) -> Result<TestContext<Req, Resp>, Error>
where
    H: Handler<Req, Resp> + ?Sized,
{
    let TestRequest {
        request,
        invocation,
        locals,
    } = request.into();
    let mut ctx = Context::new(request, invocation);
    ctx.locals = locals;

    let result = handler.call(&mut ctx).await;
    match Outcome::classify(result, &mut ctx.response).into_error() {
        Some(err) => Err(err),
        None => Ok(TestContext { ctx }),
    }
}
