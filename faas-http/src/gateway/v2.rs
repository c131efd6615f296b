//! v2 (HTTP API) envelopes.
//!
//! The v2 trigger joins repeated query and header values with commas and
//! moves cookies into a top-level array. Inbound values are kept exactly as
//! the trigger sent them, one value per key; outbound header sequences are
//! joined back with commas.

use std::collections::HashMap;

use faas_http_core::{Error, MultiValues, PathParams};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::v1::encode_body;
use super::{Adapter, parse_method};
use crate::context::Invocation;
use crate::request::{Request, RequestBuilder};
use crate::response::Parts;

/// Inbound v2 HTTP API event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub route_key: Option<String>,
    #[serde(default)]
    pub raw_path: String,
    #[serde(default)]
    pub raw_query_string: Option<String>,
    #[serde(default)]
    pub cookies: Option<Vec<String>>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub request_context: RequestContext,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub http: HttpDescription,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpDescription {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub source_ip: Option<String>,
}

/// Outbound v2 HTTP API response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl HttpRequest {
    /// Translate into a request builder, leaving the body for the decoder.
    pub(crate) fn into_request(self) -> (Result<RequestBuilder, Error>, String, bool) {
        let body = self.body.unwrap_or_default();
        let is_base64 = self.is_base64_encoded;

        let method = match parse_method(&self.request_context.http.method) {
            Ok(method) => method,
            Err(err) => return (Err(err), body, is_base64),
        };

        tracing::debug!(%method, path = %self.raw_path, "translating v2 request");
        let builder = Request::builder()
            .method(method)
            .path(self.raw_path)
            .path_params(PathParams::from(self.path_parameters.unwrap_or_default()))
            .queries(MultiValues::from(self.query_string_parameters.unwrap_or_default()))
            .headers(MultiValues::from(self.headers.unwrap_or_default()))
            .cookie_lines(self.cookies.unwrap_or_default());
        (Ok(builder), body, is_base64)
    }
}

impl From<Parts> for HttpResponse {
    fn from(parts: Parts) -> Self {
        let headers = parts
            .headers
            .into_iter()
            .map(|(key, values)| (key, values.join(",")))
            .collect();
        let (body, is_base64_encoded) = encode_body(&parts.body);
        Self {
            status_code: parts.status.as_u16(),
            headers,
            cookies: parts.cookies.iter().map(ToString::to_string).collect(),
            body,
            is_base64_encoded,
        }
    }
}

impl<Req, Resp> Adapter<Req, Resp>
where
    Req: DeserializeOwned + Default + Send + 'static,
    Resp: Send + 'static,
{
    /// Handle one v2 HTTP API event.
    ///
    /// Same error contract as [`Adapter::invoke_v1`].
    pub async fn invoke_v2(
        &self,
        invocation: Invocation,
        event: HttpRequest,
    ) -> Result<HttpResponse, Error> {
        let (request, body, is_base64) = event.into_request();
        let parts = self.dispatch(invocation, request, &body, is_base64).await?;
        Ok(HttpResponse::from(parts))
    }
}
