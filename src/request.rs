use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub use floodwatch_shared::protocol::HttpMethod;

// =========================================================
// HTTP Interface Abstraction
// =========================================================

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub parts: Vec<(String, FormValue)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts
            .push((name.to_string(), FormValue::Text(value.into())));
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        self.parts.push((
            name.to_string(),
            FormValue::File {
                file_name: file_name.to_string(),
                content_type: content_type.to_string(),
                bytes,
            },
        ));
        self
    }

    /// Text value of the first part with this name.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|(key, value)| match value {
            FormValue::Text(text) if key == name => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(String),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }

    /// Text form used by the diagnostic log.
    pub fn preview(&self) -> Option<String> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(text) => Some(text.clone()),
            RequestBody::Multipart(form) => {
                let parts: Vec<String> = form
                    .parts
                    .iter()
                    .map(|(name, value)| match value {
                        FormValue::Text(text) => format!("{}={}", name, text),
                        FormValue::File {
                            file_name,
                            content_type,
                            bytes,
                        } => format!(
                            "{}=File: {} ({}, {} bytes)",
                            name,
                            file_name,
                            content_type,
                            bytes.len()
                        ),
                    })
                    .collect();
                Some(format!("multipart {{{}}}", parts.join(", ")))
            }
        }
    }
}

/// Fully resolved request handed to a transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: BTreeMap::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON. An empty body is `null`.
    pub fn json_value(&self) -> ApiResult<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body).map_err(ApiError::from)
    }
}

/// HTTP transport.
///
/// `?Send` because the client runs on a single-threaded event loop and the
/// browser transport is built on non-`Send` JS handles.
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse>;
}

// =========================================================
// Query string encoding
// =========================================================

pub use floodwatch_shared::protocol::encode_component;

/// Flattens a JSON object into `key=value` pairs. Nulls, arrays and nested
/// objects are skipped.
pub fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = params else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), text))
        })
        .collect()
}

pub fn append_query(url: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return url.to_string();
    }
    let query: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, query.join("&"))
}

// =========================================================
// Native transport: reqwest
// =========================================================

#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

#[cfg(not(target_arch = "wasm32"))]
impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn multipart(form: MultipartForm) -> ApiResult<reqwest::multipart::Form> {
        let mut out = reqwest::multipart::Form::new();
        for (name, value) in form.parts {
            out = match value {
                FormValue::Text(text) => out.text(name, text),
                FormValue::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let part = reqwest::multipart::Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&content_type)
                        .map_err(|e| {
                            ApiError::invalid_input(format!("Invalid content type: {}", content_type))
                                .with_source(e)
                        })?;
                    out.part(name, part)
                }
            };
        }
        Ok(out)
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait::async_trait(?Send)]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        let method = match req.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.client.request(method, &req.url);

        for (k, v) in &req.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }

        if let Some(timeout) = req.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match req.body {
            RequestBody::Empty => builder,
            RequestBody::Json(text) => builder.body(text),
            RequestBody::Multipart(form) => builder.multipart(Self::multipart(form)?),
        };

        let resp = builder.send().await.map_err(transport_error)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport_error)?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::timeout(e.to_string()).with_source(e)
    } else {
        ApiError::network(e.to_string()).with_source(e)
    }
}

// =========================================================
// Test double: MockHttpClient
// =========================================================

#[cfg(test)]
pub use mock::MockHttpClient;
