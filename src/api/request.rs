//! Single outbound request execution.
//!
//! The executor owns header assembly and nothing else: callers hand it a
//! path, options, and the current credential; it returns the raw response
//! without interpreting the status. Retries belong to the orchestrator in
//! [`crate::api::client`].

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{multipart, Client, Method, Response};
use serde_json::Value;

use crate::api::ApiError;

/// One field of a multipart form, held as owned bytes so the request can
/// be rebuilt for the orchestrator's retry.
#[derive(Debug, Clone)]
pub struct MultipartField {
    pub name: String,
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}

/// Request body variants. A multipart body suppresses the default JSON
/// content type; reqwest supplies the boundary header itself.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<MultipartField>),
}

/// Caller-tunable pieces of a request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            headers: HeaderMap::new(),
            body: RequestBody::Json(body),
        }
    }

    pub fn multipart(fields: Vec<MultipartField>) -> Self {
        Self {
            method: Method::POST,
            headers: HeaderMap::new(),
            body: RequestBody::Multipart(fields),
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Executor for one outbound call against the configured API origin.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RequestExecutor {
    http: Client,
    api_origin: String,
}

impl RequestExecutor {
    pub fn new(http: Client, api_origin: String) -> Self {
        Self { http, api_origin }
    }

    /// Issue one call. The response comes back uninterpreted, whatever its
    /// status; no retry logic lives here.
    pub async fn execute(
        &self,
        path: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.api_origin, path);
        let headers = build_headers(options, token)?;

        let mut request = self
            .http
            .request(options.method.clone(), &url)
            .headers(headers);
        request = match &options.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart(fields) => request.multipart(build_form(fields)),
        };

        request.send().await.map_err(ApiError::Network)
    }
}

/// Assemble the final header set: caller headers win, a JSON content type
/// is filled in unless the body is multipart, and the bearer credential is
/// attached when present.
fn build_headers(options: &RequestOptions, token: Option<&str>) -> Result<HeaderMap, ApiError> {
    let mut headers = options.headers.clone();

    let multipart_body = matches!(options.body, RequestBody::Multipart(_));
    if !multipart_body && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(ApiError::InvalidCredential)?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

fn build_form(fields: &[MultipartField]) -> multipart::Form {
    let mut form = multipart::Form::new();
    for field in fields {
        let mut part = multipart::Part::bytes(field.content.clone());
        if let Some(ref file_name) = field.file_name {
            part = part.file_name(file_name.clone());
        }
        form = form.part(field.name.clone(), part);
    }
    form
}
