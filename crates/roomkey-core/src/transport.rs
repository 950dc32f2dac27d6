//! Transport abstraction.
//!
//! A [`Transport`] sends one request and owns a map of default headers that
//! it applies to every request at send time. The coordinator mutates only the
//! `Authorization` entry of that map.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;
use crate::error::DecodeError;

/// Name of the header carrying the access token.
pub const AUTHORIZATION: &str = "authorization";

/// HTTP verbs the SDK issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(crate::error::InvalidInputError::Other {
                message: format!("unsupported HTTP method '{}'", other),
            }
            .into()),
        }
    }
}

/// A request the SDK can replay after a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Decoded JSON body; `null` when the server sent no content.
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// Decode the body into a typed value.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.body)
            .map_err(|e| DecodeError::new(format!("HTTP {} response", self.status), e).into())
    }
}

/// Something that can carry API requests.
///
/// `send` resolves to `Err` for every non-success status, with an error whose
/// [`crate::Error::status`] reports the code. Default headers are read when
/// the request is sent, not when it is built, so a replay after a refresh
/// carries the new `Authorization` value.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a single request.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;

    /// Set a default header applied to every subsequent request.
    fn set_header(&self, name: &str, value: &str) -> Result<()>;

    /// Remove a default header.
    fn remove_header(&self, name: &str);

    /// Current value of a default header.
    fn header(&self, name: &str) -> Option<String>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        (**self).send(request).await
    }

    fn set_header(&self, name: &str, value: &str) -> Result<()> {
        (**self).set_header(name, value)
    }

    fn remove_header(&self, name: &str) {
        (**self).remove_header(name)
    }

    fn header(&self, name: &str) -> Option<String> {
        (**self).header(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn response_decodes_typed_body() {
        #[derive(Deserialize)]
        struct Hotel {
            name: String,
        }

        let response = ApiResponse::ok(serde_json::json!({ "name": "Grand" }));
        let hotel: Hotel = response.json().unwrap();
        assert_eq!(hotel.name, "Grand");
    }

    #[test]
    fn response_decode_mismatch_is_decode_error() {
        let response = ApiResponse::ok(serde_json::json!([1, 2, 3]));
        let err = response.json::<String>().unwrap_err();
        assert!(matches!(err, crate::Error::Decode(_)));
    }

    #[test]
    fn request_builder_collects_query_and_body() {
        let request = ApiRequest::put("/rooms/7")
            .with_query("notify", "true")
            .with_body(serde_json::json!({ "price": 120 }));
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.query, vec![("notify".to_string(), "true".to_string())]);
        assert!(request.body.is_some());
    }
}
