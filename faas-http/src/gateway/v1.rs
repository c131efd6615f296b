//! v1 (REST proxy) envelopes.
//!
//! Inbound query strings and headers prefer the multi-valued maps and fall
//! back to the single-valued ones. Outbound responses carry both header
//! shapes; cookies travel as `Set-Cookie` entries in `multiValueHeaders`.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use faas_http_core::{Error, MultiValues, PathParams};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Adapter, parse_method};
use crate::context::Invocation;
use crate::request::{Request, RequestBuilder};
use crate::response::Parts;

const COOKIE_HEADERS: [&str; 2] = ["Cookie", "cookie"];
const SET_COOKIE: &str = "Set-Cookie";

/// Inbound v1 proxy event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub http_method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub multi_value_query_string_parameters: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// Outbound v1 proxy response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub multi_value_headers: HashMap<String, Vec<String>>,
    pub body: String,
    pub is_base64_encoded: bool,
}

/// Prefer the multi-valued map; fall back to the single-valued one.
fn pick(
    multi: Option<HashMap<String, Vec<String>>>,
    single: Option<HashMap<String, String>>,
) -> MultiValues {
    match (multi, single) {
        (Some(multi), _) if !multi.is_empty() => MultiValues::from(multi),
        (_, Some(single)) => MultiValues::from(single),
        _ => MultiValues::new(),
    }
}

impl ProxyRequest {
    /// Translate into a request builder, leaving the body for the decoder.
    pub(crate) fn into_request(self) -> (Result<RequestBuilder, Error>, String, bool) {
        let body = self.body.unwrap_or_default();
        let is_base64 = self.is_base64_encoded;

        let method = match parse_method(&self.http_method) {
            Ok(method) => method,
            Err(err) => return (Err(err), body, is_base64),
        };
        let headers = pick(self.multi_value_headers, self.headers);
        let cookies = COOKIE_HEADERS
            .iter()
            .find_map(|key| headers.strings(key).ok())
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        tracing::debug!(%method, path = %self.path, "translating v1 request");
        let builder = Request::builder()
            .method(method)
            .path(self.path)
            .path_params(PathParams::from(self.path_parameters.unwrap_or_default()))
            .queries(pick(
                self.multi_value_query_string_parameters,
                self.query_string_parameters,
            ))
            .headers(headers)
            .cookie_lines(cookies);
        (Ok(builder), body, is_base64)
    }
}

/// Encode a body for the envelope: UTF-8 text as-is, anything else base64.
pub(crate) fn encode_body(body: &[u8]) -> (String, bool) {
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (STANDARD.encode(body), true),
    }
}

impl From<Parts> for ProxyResponse {
    fn from(parts: Parts) -> Self {
        let mut headers = HashMap::new();
        let mut multi_value_headers = HashMap::new();
        for (key, values) in parts.headers {
            if let Some(last) = values.last() {
                headers.insert(key.clone(), last.clone());
            }
            multi_value_headers.insert(key, values);
        }
        if !parts.cookies.is_empty() {
            multi_value_headers
                .entry(SET_COOKIE.to_string())
                .or_insert_with(Vec::new)
                .extend(parts.cookies.iter().map(ToString::to_string));
        }

        let (body, is_base64_encoded) = encode_body(&parts.body);
        Self {
            status_code: parts.status.as_u16(),
            headers,
            multi_value_headers,
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
    /// Handle one v1 proxy event.
    ///
    /// Errors from the handler, the body decoder or the response builder are
    /// rendered into the returned envelope. `Err` means the error handler
    /// itself failed and the host should fail the invocation.
    pub async fn invoke_v1(
        &self,
        invocation: Invocation,
        event: ProxyRequest,
    ) -> Result<ProxyResponse, Error> {
        let (request, body, is_base64) = event.into_request();
        let parts = self.dispatch(invocation, request, &body, is_base64).await?;
        Ok(ProxyResponse::from(parts))
    }
}
