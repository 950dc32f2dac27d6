//! HTTP transport implementation.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use roomkey_core::error::{DecodeError, InvalidInputError, TransportError};
use roomkey_core::{ApiRequest, ApiResponse, ApiUrl, HttpConfig, Method, Result, Transport};

use crate::error::{status_error, transport_error};

/// reqwest-backed [`Transport`].
///
/// Default headers live in a lock-protected map and are copied onto each
/// request when it is sent.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: ApiUrl,
    timeout: Duration,
    headers: RwLock<HeaderMap>,
}

impl HttpTransport {
    /// Create a transport for the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend
    /// initialisation failed).
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url,
            timeout: config.timeout,
            headers: RwLock::new(HeaderMap::new()),
        })
    }

    /// Returns the API base URL this transport is configured for.
    pub fn base_url(&self) -> &ApiUrl {
        &self.base_url
    }

    fn default_headers(&self) -> HeaderMap {
        self.headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Turn a response into an [`ApiResponse`] or a status error.
    async fn handle_response(&self, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        trace!(status = %status, "HTTP response");

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &bytes).into());
        }

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| DecodeError::new(format!("HTTP {} response", status.as_u16()), e))?
        };

        Ok(ApiResponse::new(status.as_u16(), body))
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        InvalidInputError::Header {
            name: name.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.base_url.endpoint(&request.path)?;
        debug!(%url, "HTTP request");

        let mut builder = self
            .client
            .request(to_reqwest(request.method), &url)
            .headers(self.default_headers());

        if !request.query.is_empty() {
            trace!(query = ?request.query, "query parameters");
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        self.handle_response(response).await
    }

    fn set_header(&self, name: &str, value: &str) -> Result<()> {
        let name = header_name(name)?;
        let mut value = HeaderValue::from_str(value).map_err(|e| InvalidInputError::Header {
            name: name.as_str().to_string(),
            reason: e.to_string(),
        })?;
        if name == AUTHORIZATION {
            value.set_sensitive(true);
        }

        self.headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, value);
        Ok(())
    }

    fn remove_header(&self, name: &str) {
        if let Ok(name) = header_name(name) {
            self.headers
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(name);
        }
    }

    fn header(&self, name: &str) -> Option<String> {
        let name = header_name(name).ok()?;
        self.headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}
