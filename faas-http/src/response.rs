//! Mutable builder for the outbound call.
//!
//! Every builder method returns `&mut Self` so calls chain fluently:
//!
//! ```
//! use faas_http::{Empty, Response};
//! use http::StatusCode;
//!
//! let mut resp = Response::<Empty>::new();
//! resp.status(StatusCode::CREATED)
//!     .header("X-Request-Id", "abc")
//!     .json(&serde_json::json!({"id": 7}));
//!
//! assert_eq!(resp.status_code(), StatusCode::CREATED);
//! assert_eq!(resp.body(), br#"{"id":7}"#);
//! ```
//!
//! Body writers that fail to serialize do not return the error. It is kept
//! on the response as a deferred error and surfaced by the adapter once the
//! handler returns.

use std::marker::PhantomData;

use bytes::{BufMut, Bytes, BytesMut};
use faas_http_core::{Cookie, Error, MultiValues};
use http::StatusCode;
use serde::Serialize;

use crate::request::Empty;

const CONTENT_TYPE: &str = "Content-Type";
const LOCATION: &str = "Location";
const APPLICATION_JSON: &str = "application/json";

/// The outbound response. `T` is the body type the handler declares it
/// writes; it is used by the test harness to decode the body.
#[derive(Debug)]
pub struct Response<T = Empty> {
    status: StatusCode,
    headers: MultiValues,
    cookies: Vec<Cookie>,
    body: BytesMut,
    error: Option<Error>,
    _body: PhantomData<fn() -> T>,
}

impl<T> Default for Response<T> {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: MultiValues::new(),
            cookies: Vec::new(),
            body: BytesMut::new(),
            error: None,
            _body: PhantomData,
        }
    }
}

impl<T> Response<T> {
    /// An empty `200 OK` response.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Append a header value. Existing values under `key` are kept.
    pub fn header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.append(key, value);
        self
    }

    /// Replace every value under `key` with `value`.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.set(key, value);
        self
    }

    /// Serialize `data` as the body and set `Content-Type: application/json`.
    ///
    /// Any previous body is discarded. On failure the body is left empty and
    /// the error is recorded as the deferred error.
    pub fn json<B>(&mut self, data: &B) -> &mut Self
    where
        B: Serialize + ?Sized,
    {
        self.headers.set(CONTENT_TYPE, APPLICATION_JSON);
        self.write_json(data)
    }

    /// Write `value` as a JSON string body, e.g. `data` becomes `"data"`.
    ///
    /// Does not touch `Content-Type`.
    pub fn send_string(&mut self, value: &str) -> &mut Self {
        self.write_json(value)
    }

    /// Point the caller at `url`. Defaults to `307 Temporary Redirect`.
    pub fn redirect(&mut self, url: impl Into<String>, status: Option<StatusCode>) -> &mut Self {
        self.status = status.unwrap_or(StatusCode::TEMPORARY_REDIRECT);
        self.headers.set(LOCATION, url);
        self
    }

    /// Queue a cookie. Cookies are appended, never merged by name.
    pub fn set_cookie(&mut self, cookie: Cookie) -> &mut Self {
        self.cookies.push(cookie);
        self
    }

    /// Queue a valueless cookie that expires `name` on the caller's side.
    pub fn unset_cookie(&mut self, name: impl Into<String>) -> &mut Self {
        self.set_cookie(Cookie::expired(name))
    }

    /// Record a deferred error. A later failure replaces an earlier one.
    pub fn fail(&mut self, error: Error) -> &mut Self {
        self.error = Some(error);
        self
    }

    fn write_json<B>(&mut self, data: &B) -> &mut Self
    where
        B: Serialize + ?Sized,
    {
        self.body.clear();
        if let Err(err) = serde_json::to_writer((&mut self.body).writer(), data) {
            self.body.clear();
            self.error = Some(err.into());
        }
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &MultiValues {
        &self.headers
    }

    /// Queued cookies, in the order they were set.
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The deferred error, if a body write failed.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Split into the parts the gateway encodes.
    pub fn into_parts(self) -> Parts {
        Parts {
            status: self.status,
            headers: self.headers,
            cookies: self.cookies,
            body: self.body.freeze(),
        }
    }
}

/// The status/headers/cookies/body tuple a finished [`Response`] hands to
/// the gateway.
#[derive(Debug, Clone)]
pub struct Parts {
    pub status: StatusCode,
    pub headers: MultiValues,
    pub cookies: Vec<Cookie>,
    pub body: Bytes,
}
