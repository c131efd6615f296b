//! Error hierarchy shared by handlers, middleware and the adapter.
//!
//! This module provides:
//! - [`Error`]: the error every handler and middleware returns
//! - [`HttpRenderable`]: the capability an error implements to choose its own
//!   status, headers and body
//! - [`HttpError`]: the stock renderable error
//!
//! An [`Error`] is a chain. [`Error::Wrapped`] adds context around an inner
//! error and [`Error::inner`] steps one link down; the resolution pipeline
//! walks that chain looking for the first [`Error::Http`] link.

use std::fmt;

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;

use crate::values::{Values, ValueError};

/// Boxed dynamic error used for foreign failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Capability of an error that knows how to present itself over HTTP.
///
/// Implement this for your own error types and return them through
/// [`Error::http`] to control what the caller sees.
pub trait HttpRenderable: fmt::Debug + fmt::Display + Send + Sync {
    /// Status code to answer with.
    fn http_status_code(&self) -> StatusCode;

    /// Extra response headers.
    fn http_headers(&self) -> Values {
        Values::new()
    }

    /// Serialized body. A failure here makes the pipeline fall back to the
    /// generic internal error.
    fn http_body(&self) -> Result<Bytes, Error>;
}

/// Error returned by handlers, middleware and resources.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A plain message.
    #[error("{0}")]
    Message(String),

    /// A foreign error (decode failures, I/O, ...).
    #[error(transparent)]
    Source(BoxError),

    /// An error that renders its own HTTP response.
    #[error("{0}")]
    Http(Box<dyn HttpRenderable>),

    /// Context wrapped around another error.
    #[error("{context}: {inner}")]
    Wrapped {
        context: String,
        #[source]
        inner: Box<Error>,
    },
}

impl Error {
    /// Create a plain message error.
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Message(message.into())
    }

    /// Box a foreign error.
    ///
    /// An [`HttpError`] passed here still becomes an [`Error::Http`] link,
    /// so it renders the same as through [`Error::http`].
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let boxed: BoxError = Box::new(err);
        match boxed.downcast::<HttpError>() {
            Ok(http) => Error::Http(http),
            Err(other) => Error::Source(other),
        }
    }

    /// Wrap a renderable error.
    pub fn http<E>(err: E) -> Self
    where
        E: HttpRenderable + 'static,
    {
        Error::Http(Box::new(err))
    }

    /// Add context around this error.
    pub fn wrap(self, context: impl Into<String>) -> Self {
        Error::Wrapped {
            context: context.into(),
            inner: Box::new(self),
        }
    }

    /// The next link down, if this link wraps another error.
    pub fn inner(&self) -> Option<&Error> {
        match self {
            Error::Wrapped { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// Iterate this error and every wrapped link below it, outermost first.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// The HTTP capability of this link, if it has one.
    pub fn as_renderable(&self) -> Option<&dyn HttpRenderable> {
        match self {
            Error::Http(renderable) => Some(renderable.as_ref()),
            _ => None,
        }
    }
}

/// Iterator over the links of an [`Error`].
#[derive(Clone, Debug)]
pub struct Chain<'a> {
    next: Option<&'a Error>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Error;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.inner();
        Some(current)
    }
}

impl From<ValueError> for Error {
    fn from(err: ValueError) -> Self {
        Error::new(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(err)
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        Error::http(err)
    }
}

/// Attach context to the error side of a `Result`.
///
/// ```
/// use faas_http_core::{Error, ResultExt};
///
/// let res: Result<(), Error> = Err(Error::msg("connection reset"));
/// let err = res.context("loading user").unwrap_err();
/// assert_eq!(err.to_string(), "loading user: connection reset");
/// assert!(err.inner().is_some());
/// ```
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, Error>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, context: impl Into<String>) -> Result<T, Error> {
        self.map_err(|e| e.into().wrap(context))
    }
}

// ============================================================================
// HttpError - the stock renderable error
// ============================================================================

/// An error with an explicit status, headers and message.
///
/// Renders as `{"message": "..."}`; an empty message renders as `{}`.
///
/// # Example
///
/// ```
/// use faas_http_core::{Error, HttpError, HttpRenderable};
/// use http::StatusCode;
///
/// let err = HttpError::not_found("user 7 not found").with_header("x-reason", "missing");
/// assert_eq!(err.http_status_code(), StatusCode::NOT_FOUND);
/// assert_eq!(&err.http_body().unwrap()[..], br#"{"message":"user 7 not found"}"#);
///
/// let err: Error = err.into();
/// assert!(err.as_renderable().is_some());
/// ```
#[derive(Clone, Debug)]
pub struct HttpError {
    status: StatusCode,
    headers: Values,
    message: String,
}

#[derive(Serialize)]
struct HttpErrorBody<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    message: &'a str,
}

impl HttpError {
    /// Create a new error with a status and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            headers: Values::new(),
            message: message.into(),
        }
    }

    /// Create a new error with just a status.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, "")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Add a response header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.status)
        } else {
            f.write_str(&self.message)
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpRenderable for HttpError {
    fn http_status_code(&self) -> StatusCode {
        self.status
    }

    fn http_headers(&self) -> Values {
        self.headers.clone()
    }

    fn http_body(&self) -> Result<Bytes, Error> {
        let body = serde_json::to_vec(&HttpErrorBody {
            message: &self.message,
        })?;
        Ok(Bytes::from(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Teapot;

    impl fmt::Display for Teapot {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("short and stout")
        }
    }

    impl HttpRenderable for Teapot {
        fn http_status_code(&self) -> StatusCode {
            StatusCode::IM_A_TEAPOT
        }

        fn http_body(&self) -> Result<Bytes, Error> {
            Ok(Bytes::from_static(b"\"tea\""))
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::msg("boom").to_string(), "boom");
        assert_eq!(Error::http(Teapot).to_string(), "short and stout");
        assert_eq!(
            Error::msg("boom").wrap("outer").wrap("outermost").to_string(),
            "outermost: outer: boom"
        );
    }

    #[test]
    fn test_inner_steps_one_link() {
        let err = Error::msg("root").wrap("ctx");
        let inner = err.inner().expect("wrapped error has an inner link");
        assert!(matches!(inner, Error::Message(m) if m == "root"));
        assert!(inner.inner().is_none());
    }

    #[test]
    fn test_chain_visits_every_link() {
        let err = Error::http(Teapot).wrap("a").wrap("b");
        let links: Vec<_> = err.chain().collect();
        assert_eq!(links.len(), 3);
        assert!(links[0].as_renderable().is_none());
        assert!(links[1].as_renderable().is_none());
        assert_eq!(
            links[2].as_renderable().map(|r| r.http_status_code()),
            Some(StatusCode::IM_A_TEAPOT)
        );
    }

    #[test]
    fn test_std_source_follows_wrap() {
        use std::error::Error as _;

        let err = Error::msg("root").wrap("ctx");
        assert_eq!(err.source().map(|s| s.to_string()), Some("root".into()));
    }

    #[test]
    fn test_new_keeps_http_error_renderable() {
        let err = Error::new(HttpError::not_found("no such user"));
        assert!(matches!(err, Error::Http(_)));
        let renderable = err.as_renderable().unwrap();
        assert_eq!(renderable.http_status_code(), StatusCode::NOT_FOUND);

        let wrapped = Error::new(HttpError::conflict("taken")).wrap("create user");
        let found = wrapped.chain().find_map(Error::as_renderable).unwrap();
        assert_eq!(found.http_status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_new_boxes_foreign_error() {
        let io = std::io::Error::other("disk full");
        let err = Error::new(io);
        assert!(matches!(err, Error::Source(_)));
        assert!(err.as_renderable().is_none());
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_from_conversions() {
        let err: Error = ValueError::KeyNotFound("id".into()).into();
        assert!(matches!(err, Error::Source(_)));
        assert_eq!(err.to_string(), "key not found: id");

        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Source(_)));

        let err: Error = HttpError::bad_request("bad").into();
        assert!(err.as_renderable().is_some());
    }

    #[test]
    fn test_result_ext_context() {
        let res: Result<(), ValueError> = Err(ValueError::KeyNotFound("id".into()));
        let err = res.context("reading path").unwrap_err();
        assert_eq!(err.to_string(), "reading path: key not found: id");
    }

    #[test]
    fn test_http_error_render() {
        let err = HttpError::not_found("missing").with_header("x-a", "1");
        assert_eq!(err.http_status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.http_headers().string("x-a"), Some("1"));
        let body: serde_json::Value = serde_json::from_slice(&err.http_body().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"message": "missing"}));
    }

    #[test]
    fn test_http_error_empty_message() {
        let err = HttpError::from_status(StatusCode::FORBIDDEN);
        assert_eq!(&err.http_body().unwrap()[..], b"{}");
        assert_eq!(err.to_string(), "403 Forbidden");
    }

    #[test]
    fn test_http_error_constructors() {
        assert_eq!(HttpError::bad_request("").status(), StatusCode::BAD_REQUEST);
        assert_eq!(HttpError::unauthorized("").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(HttpError::forbidden("").status(), StatusCode::FORBIDDEN);
        assert_eq!(HttpError::conflict("").status(), StatusCode::CONFLICT);
        assert_eq!(
            HttpError::unprocessable("x").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(HttpError::unprocessable("x").message(), "x");
    }
}
