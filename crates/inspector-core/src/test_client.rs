//! In-process client for driving an [`App`] in tests
//!
//! Requests go through the same middleware stack and router a served app
//! uses, without binding a socket.
//!
//! # Example
//!
//! ```rust,ignore
//! use inspector_core::{App, Request, TestClient};
//!
//! async fn hello(_req: Request) -> &'static str {
//!     "Hello, World!"
//! }
//!
//! #[tokio::test]
//! async fn test_hello() {
//!     let client = TestClient::new(App::new().get("/", hello));
//!
//!     let response = client.get("/").await;
//!     response.assert_status(200);
//!     assert_eq!(response.text(), "Hello, World!");
//! }
//! ```

use crate::app::App;
use crate::error::ApiError;
use crate::middleware::{BoxedNext, LayerStack};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::{de::DeserializeOwned, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

/// Test client for integration testing without network binding
pub struct TestClient {
    handler: BoxedNext,
    layers: Arc<LayerStack>,
    body_limit: usize,
}

impl TestClient {
    /// Create a test client from an app
    pub fn new(app: App) -> Self {
        let body_limit = app.get_body_limit();
        let (router, layers) = app.into_parts();
        Self {
            handler: router.into_handler(),
            layers: Arc::new(layers),
            body_limit,
        }
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a POST request with a JSON body
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> TestResponse {
        self.request(TestRequest::post(path).json(body)).await
    }

    /// Send a fully built request
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let body = req.body.unwrap_or_default();
        if body.len() > self.body_limit {
            let response = ApiError::payload_too_large(format!(
                "Request body exceeds limit of {} bytes",
                self.body_limit
            ))
            .into_response();
            return TestResponse::from_response(response).await;
        }

        let mut http_req = http::Request::new(body);
        *http_req.method_mut() = req.method;
        *http_req.uri_mut() = req
            .path
            .parse()
            .unwrap_or_else(|_| http::Uri::from_static("/"));
        *http_req.headers_mut() = req.headers;

        let mut request = Request::from_http(http_req);
        if let Some(addr) = req.remote_addr {
            request = request.with_remote_addr(addr);
        }

        let response = self.layers.execute(request, self.handler.clone()).await;
        TestResponse::from_response(response).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    remote_addr: Option<SocketAddr>,
}

impl TestRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
            remote_addr: None,
        }
    }

    /// Create a GET request
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PUT request
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a PATCH request
    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Create a DELETE request
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a header; repeated names keep every value
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            key.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, val);
        }
        self
    }

    /// Set the body as JSON and the Content-Type to `application/json`
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(body) {
            self.body = Some(Bytes::from(bytes));
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Set the body as raw bytes
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the Content-Type header
    pub fn content_type(mut self, content_type: &str) -> Self {
        if let Ok(val) = HeaderValue::from_str(content_type) {
            self.headers.insert(header::CONTENT_TYPE, val);
        }
        self
    }

    /// Pretend the request came from this peer
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Response status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Response body as (lossy) UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Assert the status code
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert a header value
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self
            .headers
            .get(key)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    /// Assert the body contains a substring
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't contain `expected`.
    pub fn assert_body_contains(&self, expected: &str) -> &Self {
        let body = self.text();
        assert!(
            body.contains(expected),
            "Expected body to contain '{}', got '{}'",
            expected,
            body
        );
        self
    }
}
