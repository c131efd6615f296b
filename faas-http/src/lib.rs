//! # faas-http
//!
//! Write one HTTP handler against a typed request/response abstraction and
//! run it behind a function-as-a-service HTTP trigger, v1 (REST proxy) or
//! v2 (HTTP API), without touching either wire format.
//!
//! ## Features
//!
//! - **Typed bodies:** request bodies are decoded into your type before the
//!   handler runs; responses are built with a fluent builder.
//! - **Onion middleware:** compose middleware around the handler with
//!   [`Chain`]; each layer runs code before and after the rest of the chain.
//! - **Error resolution:** return any [`Error`]; errors that implement
//!   [`HttpRenderable`] pick their own status and body, everything else
//!   becomes a generic `500` that never leaks the original message.
//! - **Resources:** start databases and brokers once, before the first call.
//! - **Testing:** run handlers in-process with [`testing::run`].
//!
//! ## Getting Started
//!
//! Check out the `README.md` file for a walk-through.

pub mod config;
pub mod context;
pub mod gateway;
pub mod handler;
pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod testing;

pub use config::{Resource, StartContext, StartError};
pub use context::{Context, Invocation, Locals};
pub use gateway::{Adapter, AdapterBuilder};
pub use handler::{BoxFuture, Handler, Outcome};
pub use middleware::{Chain, Middleware, Next, use_middleware};
pub use pipeline::{ErrorHandler, ErrorResponse, resolve_error};
pub use request::{Empty, Request, RequestBuilder};
pub use response::{Parts, Response};

pub use faas_http_core::{
    BoxError, Cookie, Error, FromValue, HttpError, HttpRenderable, MultiValues, PathParams,
    ResultExt, SameSite, ValueError, Values, parse_cookies,
};

// Re-export several crates
pub use http;
pub use serde;

pub mod prelude {
    //! A prelude for `faas-http` providing the most common types.
    pub use crate::context::{Context, Invocation};
    pub use crate::gateway::Adapter;
    pub use crate::handler::{BoxFuture, Handler};
    pub use crate::middleware::{Chain, Middleware, Next};
    pub use crate::request::{Empty, Request};
    pub use crate::response::Response;
    pub use faas_http_core::{Cookie, Error, HttpError, HttpRenderable, ResultExt, SameSite};
}
