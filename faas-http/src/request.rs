//! Read-only typed view of an inbound call.
//!
//! A [`Request`] is assembled by the gateway (or by the test harness) and
//! handed to the chain inside a [`Context`](crate::Context). The body has
//! already been decoded into `T` by the time a handler sees it.

use std::collections::HashMap;
use std::sync::OnceLock;

use faas_http_core::{MultiValues, PathParams, parse_cookies};
use http::Method;
use serde::{Deserialize, Serialize};

/// Body type for handlers that neither read nor write a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// An inbound HTTP call with a decoded body of type `T`.
#[derive(Debug)]
pub struct Request<T> {
    method: Method,
    path: String,
    path_params: PathParams,
    query: MultiValues,
    headers: MultiValues,
    body: T,
    raw_cookies: Vec<String>,
    cookies: OnceLock<HashMap<String, String>>,
}

impl Request<()> {
    /// Start building a request. Defaults to `GET /`.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }
}

impl<T> Request<T> {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Captured route segments.
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn query(&self) -> &MultiValues {
        &self.query
    }

    pub fn headers(&self) -> &MultiValues {
        &self.headers
    }

    pub fn body(&self) -> &T {
        &self.body
    }

    pub fn into_body(self) -> T {
        self.body
    }

    /// The raw `Cookie` header lines, as received.
    pub fn raw_cookies(&self) -> &[String] {
        &self.raw_cookies
    }

    /// All request cookies.
    ///
    /// Parsed from the raw lines on first access and memoized for the life of
    /// the request; concurrent first access through `&Request` parses once.
    pub fn cookies(&self) -> &HashMap<String, String> {
        self.cookies.get_or_init(|| parse_cookies(&self.raw_cookies))
    }

    /// A single cookie value.
    pub fn cookie(&self, key: &str) -> Option<&str> {
        self.cookies().get(key).map(String::as_str)
    }

    /// Swap the body, keeping everything else (including a parsed cookie map).
    pub fn map_body<U>(self, f: impl FnOnce(T) -> U) -> Request<U> {
        Request {
            method: self.method,
            path: self.path,
            path_params: self.path_params,
            query: self.query,
            headers: self.headers,
            body: f(self.body),
            raw_cookies: self.raw_cookies,
            cookies: self.cookies,
        }
    }
}

/// Builder for [`Request`].
///
/// # Example
///
/// ```
/// use faas_http::Request;
/// use http::Method;
///
/// let req = Request::builder()
///     .method(Method::POST)
///     .path("/users/7")
///     .path_param("id", "7")
///     .query("expand", "teams")
///     .header("Cookie", "sid=abc")
///     .cookie_line("sid=abc")
///     .body("payload");
///
/// assert_eq!(req.path_params().int("id"), Ok(7));
/// assert_eq!(req.cookie("sid"), Some("abc"));
/// assert_eq!(*req.body(), "payload");
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    path_params: PathParams,
    query: MultiValues,
    headers: MultiValues,
    raw_cookies: Vec<String>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            path_params: PathParams::new(),
            query: MultiValues::new(),
            headers: MultiValues::new(),
            raw_cookies: Vec::new(),
        }
    }
}

impl RequestBuilder {
    pub(crate) fn method_ref(&self) -> &Method {
        &self.method
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(key, value);
        self
    }

    /// Replace all path parameters.
    pub fn path_params(mut self, params: PathParams) -> Self {
        self.path_params = params;
        self
    }

    /// Append a query value; repeated keys accumulate.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.append(key, value);
        self
    }

    /// Replace the whole query map.
    pub fn queries(mut self, query: MultiValues) -> Self {
        self.query = query;
        self
    }

    /// Append a header value; repeated keys accumulate.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Replace the whole header map.
    pub fn headers(mut self, headers: MultiValues) -> Self {
        self.headers = headers;
        self
    }

    /// Add one raw `Cookie` header line.
    pub fn cookie_line(mut self, line: impl Into<String>) -> Self {
        self.raw_cookies.push(line.into());
        self
    }

    /// Replace the raw `Cookie` header lines.
    pub fn cookie_lines(mut self, lines: Vec<String>) -> Self {
        self.raw_cookies = lines;
        self
    }

    /// Finish with a decoded body.
    pub fn body<T>(self, body: T) -> Request<T> {
        Request {
            method: self.method,
            path: self.path,
            path_params: self.path_params,
            query: self.query,
            headers: self.headers,
            body,
            raw_cookies: self.raw_cookies,
            cookies: OnceLock::new(),
        }
    }
}
