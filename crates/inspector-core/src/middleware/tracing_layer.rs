//! Tracing middleware
//!
//! Wraps each request in an `http_request` span and logs method, path,
//! status and duration once the inner chain has finished.

use super::layer::{BoxFuture, BoxedNext, MiddlewareLayer};
use crate::request::Request;
use std::time::Instant;
use tracing::{info_span, Instrument, Level};

/// Middleware layer that creates tracing spans for requests
///
/// # Example
///
/// ```rust,ignore
/// use inspector_core::{App, TracingLayer};
///
/// App::new()
///     .layer(TracingLayer::new().with_field("service", "orders"))
///     .get("/", handler)
/// ```
#[derive(Clone)]
pub struct TracingLayer {
    level: Level,
    custom_fields: Vec<(String, String)>,
}

impl TracingLayer {
    /// Create a new TracingLayer logging completions at INFO
    pub fn new() -> Self {
        Self::with_level(Level::INFO)
    }

    /// Create a TracingLayer with a specific level for successful requests
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            custom_fields: Vec::new(),
        }
    }

    /// Add a custom field to every completion event
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.push((key.into(), value.into()));
        self
    }

    fn fields_display(&self) -> String {
        self.custom_fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TracingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareLayer for TracingLayer {
    fn call(&self, req: Request, next: BoxedNext) -> BoxFuture {
        let level = self.level;
        let method = req.method().to_string();
        let path = req.path().to_string();
        let fields = self.fields_display();

        Box::pin(async move {
            let start = Instant::now();
            let span = info_span!(
                "http_request",
                method = %method,
                path = %path,
                status = tracing::field::Empty,
                duration_ms = tracing::field::Empty,
            );

            let response = next(req).instrument(span.clone()).await;

            let status = response.status();
            let duration_ms = start.elapsed().as_millis() as u64;
            span.record("status", status.as_u16());
            span.record("duration_ms", duration_ms);

            let _enter = span.enter();
            if status.is_client_error() || status.is_server_error() {
                tracing::warn!(
                    status = %status.as_u16(),
                    duration_ms,
                    fields = %fields,
                    error = true,
                    "Request failed"
                );
            } else {
                match level {
                    Level::TRACE => tracing::trace!(status = %status.as_u16(), duration_ms, fields = %fields, "Request completed"),
                    Level::DEBUG => tracing::debug!(status = %status.as_u16(), duration_ms, fields = %fields, "Request completed"),
                    Level::INFO => tracing::info!(status = %status.as_u16(), duration_ms, fields = %fields, "Request completed"),
                    Level::WARN => tracing::warn!(status = %status.as_u16(), duration_ms, fields = %fields, "Request completed"),
                    Level::ERROR => tracing::error!(status = %status.as_u16(), duration_ms, fields = %fields, "Request completed"),
                }
            }
            drop(_enter);

            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::LayerStack;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use std::sync::Arc;

    #[test]
    fn test_tracing_layer_creation() {
        let layer = TracingLayer::new();
        assert_eq!(layer.level, Level::INFO);
        assert!(layer.custom_fields.is_empty());

        let layer = TracingLayer::with_level(Level::DEBUG);
        assert_eq!(layer.level, Level::DEBUG);
    }

    #[test]
    fn test_custom_fields_display() {
        let layer = TracingLayer::new()
            .with_field("service", "orders")
            .with_field("version", "1.0.0");
        assert_eq!(layer.fields_display(), "service=orders version=1.0.0");
    }

    #[tokio::test]
    async fn test_tracing_layer_passes_response_through() {
        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut stack = LayerStack::new();
        stack.push(Box::new(TracingLayer::new()));

        let handler: BoxedNext = Arc::new(|_req: Request| {
            Box::pin(async {
                let mut response = http::Response::new(Full::new(Bytes::from("nope")));
                *response.status_mut() = StatusCode::NOT_FOUND;
                response
            }) as BoxFuture
        });

        let req = Request::from_http(
            http::Request::builder().uri("/missing").body(Bytes::new()).unwrap(),
        );
        let response = stack.execute(req, handler).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
