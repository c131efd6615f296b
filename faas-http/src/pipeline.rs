//! Request and error pipelines.
//!
//! Pipelines sit between the gateway envelopes and the chain:
//! - RequestPipeline: decode the raw body into the handler's request type
//! - ResponsePipeline: turn a finished call into the parts the gateway
//!   encodes, resolving errors into responses on the way
//!
//! [`resolve_error`] is the default way an error becomes a response.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use faas_http_core::{Error, MultiValues, Values};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::handler::Outcome;
use crate::response::{Parts, Response};

/// Body sent whenever an error has no HTTP rendering of its own.
pub const INTERNAL_ERROR_BODY: &[u8] = br#"{"message":"Internal Server Error"}"#;

// ============================================================================
// RequestPipeline
// ============================================================================

/// Request pipeline - decodes incoming bodies.
///
/// Handles: the no-body skip, base64, JSON decoding.
pub struct RequestPipeline;

impl RequestPipeline {
    /// Decode a raw envelope body into `T`.
    ///
    /// `GET` requests and empty bodies are not decoded and yield
    /// `T::default()`. Otherwise the body is base64-decoded when flagged and
    /// then parsed as JSON. Failures come back as [`Error::Source`].
    pub fn decode<T>(method: &Method, body: &str, is_base64: bool) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        if *method == Method::GET || body.is_empty() {
            tracing::debug!(%method, "skipping body decode");
            return Ok(T::default());
        }

        if is_base64 {
            let raw = STANDARD.decode(body).map_err(Error::new)?;
            tracing::debug!(len = raw.len(), "decoded base64 body");
            Ok(serde_json::from_slice(&raw)?)
        } else {
            Ok(serde_json::from_str(body)?)
        }
    }
}

// ============================================================================
// Error resolution
// ============================================================================

/// A rendered error: what the caller sees instead of the handler's response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub headers: Values,
    pub body: Bytes,
}

impl ErrorResponse {
    /// The generic `500` response. Carries no detail about the failure.
    pub fn internal() -> Self {
        let mut headers = Values::new();
        headers.insert("Content-Type", "application/json");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers,
            body: Bytes::from_static(INTERNAL_ERROR_BODY),
        }
    }
}

impl From<ErrorResponse> for Parts {
    fn from(resp: ErrorResponse) -> Self {
        Parts {
            status: resp.status,
            headers: MultiValues::from(resp.headers),
            cookies: Vec::new(),
            body: resp.body,
        }
    }
}

/// Resolve an error into a response.
///
/// Walks the error's chain outermost first. The first link that renders
/// itself over HTTP decides status, headers and body. If that link fails to
/// produce its body, or no link renders, the answer is the generic
/// [`ErrorResponse::internal`]; the original text is only logged.
pub fn resolve_error(err: &Error) -> ErrorResponse {
    if let Some(renderable) = err.chain().find_map(Error::as_renderable) {
        match renderable.http_body() {
            Ok(body) => {
                tracing::debug!(status = %renderable.http_status_code(), "rendering error response");
                return ErrorResponse {
                    status: renderable.http_status_code(),
                    headers: renderable.http_headers(),
                    body,
                };
            }
            Err(render_err) => {
                tracing::error!(
                    error = %err,
                    render_error = %render_err,
                    "failed to render error body"
                );
                return ErrorResponse::internal();
            }
        }
    }

    tracing::error!(error = %err, "unhandled error");
    ErrorResponse::internal()
}

/// Pluggable error-to-response stage.
///
/// A failing handler fails the whole invocation towards the host.
#[derive(Clone)]
pub struct ErrorHandler {
    inner: Arc<dyn Fn(&Error) -> Result<ErrorResponse, Error> + Send + Sync>,
}

impl ErrorHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Error) -> Result<ErrorResponse, Error> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn handle(&self, err: &Error) -> Result<ErrorResponse, Error> {
        (self.inner)(err)
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(|err| Ok(resolve_error(err)))
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler").finish_non_exhaustive()
    }
}

// ============================================================================
// ResponsePipeline
// ============================================================================

/// Response pipeline - decides the final status/headers/cookies/body.
pub struct ResponsePipeline;

impl ResponsePipeline {
    /// Finish a call whose chain ran.
    ///
    /// On [`Outcome::Ok`] the response goes out as built. Otherwise the
    /// error handler decides, and the built response (cookies included) is
    /// dropped.
    pub fn finish<Resp>(
        outcome: Outcome,
        response: Response<Resp>,
        on_error: &ErrorHandler,
    ) -> Result<Parts, Error> {
        match outcome.into_error() {
            None => Ok(response.into_parts()),
            Some(err) => Self::reject(&err, on_error),
        }
    }

    /// Answer with an error instead of a handler response.
    pub fn reject(err: &Error, on_error: &ErrorHandler) -> Result<Parts, Error> {
        on_error.handle(err).map(Parts::from)
    }
}
