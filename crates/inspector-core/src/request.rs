//! Request types for the inspector pipeline

use crate::form::{self, FormError, MultipartForm};
use bytes::Bytes;
use http::{header, request::Parts, HeaderMap, Method};
use std::net::{IpAddr, SocketAddr};

/// HTTP Request wrapper
///
/// Holds the request head plus a fully buffered body. The body can be taken
/// and put back, so a middleware can inspect it and hand the same bytes to
/// the rest of the chain.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Option<Bytes>,
    pub(crate) remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Create a new request from parts and a buffered body
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            parts,
            body: Some(body),
            remote_addr: None,
        }
    }

    /// Convert a buffered `http::Request`
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts, body)
    }

    /// Attach the peer socket address
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Raw `Content-Type` header value
    pub fn content_type(&self) -> Option<&str> {
        self.parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Borrow the body without consuming it
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Take the body bytes, leaving the request without a body
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// Put a body (back) on the request
    pub fn set_body(&mut self, body: Bytes) {
        self.body = Some(body);
    }

    /// Decoded query string pairs, in order
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query_string()
            .and_then(|q| form::parse_urlencoded(q.as_bytes()).ok())
            .unwrap_or_default()
    }

    /// Decoded url-encoded body fields
    ///
    /// Only `POST`, `PUT` and `PATCH` requests declaring
    /// `application/x-www-form-urlencoded` carry form fields; anything else
    /// yields an empty list.
    pub fn form_params(&self) -> Result<Vec<(String, String)>, FormError> {
        let has_form_body = matches!(
            *self.method(),
            Method::POST | Method::PUT | Method::PATCH
        ) && self
            .content_type()
            .map(media_type)
            .is_some_and(|m| m.eq_ignore_ascii_case("application/x-www-form-urlencoded"));

        match self.body() {
            Some(body) if has_form_body => form::parse_urlencoded(body),
            _ => Ok(Vec::new()),
        }
    }

    /// Parsed `multipart/form-data` body
    ///
    /// Returns `Ok(None)` when the request is not multipart.
    pub fn multipart_form(&self, max_memory: usize) -> Result<Option<MultipartForm>, FormError> {
        let Some(content_type) = self.content_type() else {
            return Ok(None);
        };
        if !media_type(content_type).eq_ignore_ascii_case("multipart/form-data") {
            return Ok(None);
        }

        let boundary = form::extract_boundary(content_type).ok_or(FormError::MissingBoundary)?;
        let empty = Bytes::new();
        let body = self.body().unwrap_or(&empty);
        form::parse_multipart(body, &boundary, max_memory).map(Some)
    }

    /// Cookies sent in every `Cookie` header, in order
    ///
    /// Malformed pairs are skipped.
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| {
                cookie::Cookie::split_parse(v)
                    .filter_map(|c| c.ok())
                    .map(|c| (c.name().to_string(), c.value().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Best-effort client address
    ///
    /// Checks `X-Forwarded-For` (first hop), then `X-Real-IP`, then the peer
    /// address. Returns an empty string when nothing is known.
    pub fn client_ip(&self) -> String {
        if let Some(forwarded) = self.header_str("x-forwarded-for") {
            if let Some(first_ip) = forwarded.split(',').next() {
                let ip_str = first_ip.trim();
                if ip_str.parse::<IpAddr>().is_ok() {
                    return ip_str.to_string();
                }
            }
        }

        if let Some(real_ip) = self.header_str("x-real-ip") {
            let ip_str = real_ip.trim();
            if ip_str.parse::<IpAddr>().is_ok() {
                return ip_str.to_string();
            }
        }

        self.remote_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default()
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Media type of a Content-Type value, parameters stripped
///
/// `"application/json; charset=utf-8"` becomes `"application/json"`.
pub fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .field("remote_addr", &self.remote_addr)
            .finish()
    }
}
