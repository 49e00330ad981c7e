//! Browser transport.
//!
//! Implements the client's `HttpClient` seam over `fetch` (via `gloo-net`).
//! The request timeout is raced against a `gloo-timers` future and aborts the
//! fetch when it wins.

use std::time::Duration;

use futures::future::{Either, select};
use gloo_net::http::{Request, RequestBuilder};
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsValue;
use web_sys::{AbortController, Blob, BlobPropertyBag, FormData};

use floodwatch_client::error::{ApiError, ApiResult};
use floodwatch_client::request::{
    FormValue, HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchHttpClient;

impl FetchHttpClient {
    pub fn new() -> Self {
        Self
    }

    fn builder(method: HttpMethod, url: &str) -> RequestBuilder {
        match method {
            HttpMethod::Get => Request::get(url),
            HttpMethod::Post => Request::post(url),
            HttpMethod::Put => Request::put(url),
            HttpMethod::Delete => Request::delete(url),
            HttpMethod::Patch => Request::patch(url),
        }
    }

    fn form_data(form: &MultipartForm) -> ApiResult<FormData> {
        let data = FormData::new().map_err(|e| js_error("FormData", e))?;
        for (name, value) in &form.parts {
            match value {
                FormValue::Text(text) => data
                    .append_with_str(name, text)
                    .map_err(|e| js_error("FormData.append", e))?,
                FormValue::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let chunk = js_sys::Uint8Array::from(bytes.as_slice());
                    let parts = js_sys::Array::of1(&chunk);
                    let options = BlobPropertyBag::new();
                    options.set_type(content_type);
                    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
                        .map_err(|e| js_error("Blob", e))?;
                    data.append_with_blob_and_filename(name, &blob, file_name)
                        .map_err(|e| js_error("FormData.append", e))?;
                }
            }
        }
        Ok(data)
    }
}

fn js_error(what: &str, value: JsValue) -> ApiError {
    ApiError::invalid_input(format!("{} failed: {:?}", what, value))
}

fn network_error(e: gloo_net::Error) -> ApiError {
    ApiError::network(e.to_string())
}

#[async_trait::async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        let controller = AbortController::new().map_err(|e| js_error("AbortController", e))?;
        let signal = controller.signal();

        let mut builder = Self::builder(req.method, &req.url).abort_signal(Some(&signal));
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }

        let request = match &req.body {
            RequestBody::Empty => builder.build(),
            RequestBody::Json(text) => builder.body(text.as_str()),
            RequestBody::Multipart(form) => builder.body(Self::form_data(form)?),
        }
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

        let exchange = Box::pin(async move {
            let response = request.send().await.map_err(network_error)?;
            let status = response.status();
            let body = response.text().await.map_err(network_error)?;
            Ok::<_, ApiError>(HttpResponse { status, body })
        });

        let Some(timeout) = req.timeout else {
            return exchange.await;
        };

        let timer = TimeoutFuture::new(millis(timeout));
        match select(exchange, timer).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => {
                controller.abort();
                Err(ApiError::timeout(format!(
                    "timeout of {}ms exceeded",
                    timeout.as_millis()
                )))
            }
        }
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
