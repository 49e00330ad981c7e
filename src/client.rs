//! The API client wrapper.
//!
//! Single point of egress for backend calls. Every request passes the
//! outbound interceptor (default headers, bearer token, request stamp,
//! diagnostics) and every reply passes the inbound interceptor (diagnostics,
//! 401/403 session invalidation, error normalization). No retries.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, StatusError};
use crate::events::{AuthEvent, AuthEventBus};
use crate::normalize::{self, FromPayload};
use crate::request::{
    HttpClient, HttpMethod, HttpRequest, HttpResponse, RequestBody, append_query, query_pairs,
};
use crate::storage::TokenStore;
use floodwatch_shared::protocol::ApiRequest;
use floodwatch_shared::{HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, HEADER_REQUEST_TIME, Timestamp};

/// Fields masked in diagnostic dumps.
const REDACTED_FIELDS: [&str; 2] = ["password", "token"];

/// A call before interception: relative path, query and body.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiCall {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let text = serde_json::to_string(body).map_err(|e| {
            ApiError::invalid_input(format!("Could not encode request body: {}", e)).with_source(e)
        })?;
        self.body = RequestBody::Json(text);
        Ok(self)
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

/// Shared HTTP client wrapper.
///
/// Owns the transport, the token store and the invalidation bus. One
/// instance backs every facade in the crate; share it behind an `Rc`.
pub struct ApiClient<C: HttpClient> {
    config: ClientConfig,
    transport: C,
    tokens: Rc<dyn TokenStore>,
    events: Rc<AuthEventBus>,
    custom_headers: RefCell<BTreeMap<String, String>>,
}

impl<C: HttpClient> ApiClient<C> {
    /// # Arguments
    /// * `config` - base URL, timeout, build mode and app headers
    /// * `transport` - `fetch` in the browser, reqwest natively, a mock in tests
    /// * `tokens` - where the bearer token is read from and cleared
    pub fn new(config: ClientConfig, transport: C, tokens: Rc<dyn TokenStore>) -> Self {
        Self {
            config,
            transport,
            tokens,
            events: Rc::new(AuthEventBus::new()),
            custom_headers: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }

    pub fn tokens(&self) -> &Rc<dyn TokenStore> {
        &self.tokens
    }

    pub fn events(&self) -> &Rc<AuthEventBus> {
        &self.events
    }

    /// Adds a header to every subsequent request.
    ///
    /// # Arguments
    /// * `key` - header name; replaces an earlier value for the same name
    /// * `value` - header value
    pub fn set_custom_header(&self, key: &str, value: &str) {
        self.custom_headers
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    /// Stops sending a header added with [`Self::set_custom_header`].
    pub fn clear_custom_header(&self, key: &str) {
        self.custom_headers.borrow_mut().remove(key);
    }

    // =========================================================
    // Pipeline
    // =========================================================

    /// Sends one call through both interceptors.
    ///
    /// # Returns
    /// - `Ok(response)` for any 2xx status
    /// - `Unauthorized`/`Forbidden` for 401/403, after the token was cleared
    ///   and [`AuthEvent::Invalidated`] emitted
    /// - `Http` for other statuses, carrying the backend message and body
    /// - `Network`/`Timeout` when no response arrived
    pub async fn send(&self, call: ApiCall) -> ApiResult<HttpResponse> {
        let request = self.intercept_request(call);
        let method = request.method;
        let url = request.url.clone();

        match self.transport.send(request).await {
            Ok(response) if response.is_success() => {
                self.log_response(method, &url, &response);
                Ok(response)
            }
            Ok(response) => Err(self.intercept_error(method, &url, response)),
            Err(e) => {
                if self.config.mode.is_development() {
                    log_error!(
                        "API {} {} received no response: {}",
                        method.as_str(),
                        url,
                        e.message()
                    );
                }
                Err(e.in_op_with("http.send", url))
            }
        }
    }

    /// Sends a typed request and decodes the normalized reply.
    ///
    /// GET and DELETE requests are flattened into the query string; other
    /// methods send the request as a JSON body (none when it serializes to
    /// `null`).
    ///
    /// # Errors
    /// Everything [`Self::send`] returns, plus `Decode` with a `decode` span
    /// naming the path when the reply has an unexpected shape.
    pub async fn execute<R>(&self, request: &R) -> ApiResult<R::Response>
    where
        R: ApiRequest,
        R::Response: FromPayload,
    {
        let path = request.path();
        let payload = serde_json::to_value(request).map_err(|e| {
            ApiError::invalid_input(format!("Could not encode request: {}", e)).with_source(e)
        })?;

        let call = if R::METHOD.uses_query() {
            ApiCall::new(R::METHOD, path.clone()).with_query(query_pairs(&payload))
        } else if payload.is_null() {
            ApiCall::new(R::METHOD, path.clone())
        } else {
            ApiCall::new(R::METHOD, path.clone()).with_json(&payload)?
        };

        let response = self.send(call).await?;
        let value = response
            .json_value()
            .map_err(|e| e.in_op_with("decode", path.clone()))?;
        <R::Response as FromPayload>::from_payload(value).map_err(|e| e.in_op_with("decode", path))
    }

    /// Untyped GET for endpoints without a request type.
    ///
    /// # Arguments
    /// * `path` - endpoint path relative to the base URL
    /// * `params` - JSON object flattened into the query; nulls are skipped
    pub async fn get_value(&self, path: &str, params: &Value) -> ApiResult<Value> {
        let response = self
            .send(ApiCall::get(path).with_query(query_pairs(params)))
            .await?;
        response.json_value()
    }

    /// Untyped POST for endpoints without a request type.
    pub async fn post_value<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let response = self.send(ApiCall::post(path).with_json(body)?).await?;
        response.json_value()
    }

    // =========================================================
    // Interceptors
    // =========================================================

    fn intercept_request(&self, call: ApiCall) -> HttpRequest {
        let url = append_query(&self.config.url(&call.path), &call.query);
        let mut request = HttpRequest::new(&url, call.method).with_timeout(self.config.timeout);

        for (key, value) in self.config.default_headers() {
            if key == HEADER_CONTENT_TYPE && call.body.is_multipart() {
                continue;
            }
            request = request.with_header(key, &value);
        }
        for (key, value) in self.custom_headers.borrow().iter() {
            request = request.with_header(key, value);
        }

        if let Some(token) = self.tokens.load() {
            request = request.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", token));
        }
        request = request.with_header(HEADER_REQUEST_TIME, &Timestamp::now().to_iso_string());
        request = request.with_body(call.body);

        if self.config.mode.is_development() {
            log_info!(
                "API Request: {} {} headers={:?} body={}",
                request.method.as_str(),
                request.url,
                redact_headers(&request.headers),
                request
                    .body
                    .preview()
                    .map(|b| redact_body(&b))
                    .unwrap_or_else(|| "-".to_string())
            );
        }

        request
    }

    fn log_response(&self, method: HttpMethod, url: &str, response: &HttpResponse) {
        if self.config.mode.is_development() {
            log_info!(
                "API Success: {} {} status={} data={}",
                method.as_str(),
                url,
                response.status,
                redact_body(&response.body)
            );
        }
    }

    /// Classifies a non-2xx reply. 401/403 clear the token and signal
    /// invalidation before the error is returned.
    fn intercept_error(&self, method: HttpMethod, url: &str, response: HttpResponse) -> ApiError {
        let status = response.status;
        let transport_error = StatusError { status };

        if self.config.mode.is_development() {
            log_error!(
                "API Error: {} {} status={} data={}",
                method.as_str(),
                url,
                status,
                redact_body(&response.body)
            );
        }

        let message = normalize::error_message(&response.body)
            .unwrap_or_else(|| transport_error.to_string());

        let error = ApiError::from_status(status, message)
            .with_body(response.body)
            .with_source(transport_error)
            .in_op_with("http.send", url);

        if error.kind().is_auth_rejection() {
            log_warn!("Credential rejected with {} by {}, clearing session", status, url);
            self.tokens.clear();
            self.events.emit(&AuthEvent::Invalidated {
                status,
                url: url.to_string(),
            });
        }

        error
    }
}

fn redact_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| {
            if k.eq_ignore_ascii_case(HEADER_AUTHORIZATION) {
                (k.clone(), "Bearer ***".to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}

/// Masks secrets in a JSON body. Non-JSON text is returned as is.
fn redact_body(body: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    mask(&mut value);
    value.to_string()
}

fn mask(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *inner = Value::String("***".to_string());
                } else {
                    mask(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask),
        _ => {}
    }
}
