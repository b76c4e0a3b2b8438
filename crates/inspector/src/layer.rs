//! InspectorLayer middleware: request capture and the inspection endpoint.

use crate::config::InspectorConfig;
use crate::paginate::{paginate, PageQuery};
use crate::redact::{redact_document, RedactError};
use crate::snapshot::{param_map, MultipartMeta, ParamMap, RequestSnapshot};
use crate::store::RequestLog;
use chrono::Utc;
use http::{header, HeaderMap, HeaderValue, Method};
use inspector_core::middleware::{BoxFuture, BoxedNext, MiddlewareLayer};
use inspector_core::{media_type, ApiError, IntoResponse, Json, Request, Response};
use std::sync::Arc;

/// Traffic recording middleware.
///
/// Every request outside the inspection endpoint is recorded once the
/// downstream handler has produced its response. `GET <endpoint>` answers
/// with a page of the log instead of reaching the router.
///
/// # Example
///
/// ```ignore
/// use inspector::{InspectorConfig, InspectorLayer};
/// use inspector_core::App;
///
/// let inspector = InspectorLayer::with_config(
///     InspectorConfig::new().sensitive_keys(["password"]),
/// );
///
/// let app = App::new()
///     .layer(inspector)
///     .post("/login", login);
/// ```
#[derive(Clone)]
pub struct InspectorLayer {
    config: Arc<InspectorConfig>,
    log: Arc<RequestLog>,
}

impl InspectorLayer {
    /// Create an InspectorLayer with default configuration.
    pub fn new() -> Self {
        Self::with_config(InspectorConfig::new())
    }

    /// Create an InspectorLayer with custom configuration.
    pub fn with_config(config: InspectorConfig) -> Self {
        let log = RequestLog::with_max_entries(config.max_entries);
        Self {
            config: Arc::new(config),
            log: Arc::new(log),
        }
    }

    /// Record into an existing log instead of a fresh one.
    pub fn with_log(mut self, log: Arc<RequestLog>) -> Self {
        self.log = log;
        self
    }

    /// The log this layer records into.
    pub fn log(&self) -> &Arc<RequestLog> {
        &self.log
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    fn inspection_response(req: &Request, config: &InspectorConfig, log: &RequestLog) -> Response {
        if req.method() != Method::GET {
            let mut response = ApiError::method_not_allowed(format!(
                "Method {} not allowed for {}",
                req.method(),
                config.endpoint
            ))
            .into_response();
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET"));
            return response;
        }

        let query = PageQuery::from_query(req.query_string());
        Json(paginate(log, query, &config.endpoint)).into_response()
    }

    /// Redacted copy of a JSON body and whether redaction succeeded.
    ///
    /// The request keeps the original bytes. Malformed text is stored raw;
    /// valid JSON that cannot be redacted is not stored at all.
    fn capture_json_body(req: &mut Request, config: &InspectorConfig) -> (String, bool) {
        let Some(bytes) = req.take_body() else {
            return (String::new(), true);
        };
        let text = String::from_utf8_lossy(&bytes).into_owned();
        req.set_body(bytes);

        match redact_document(&text, &config.sensitive_keys) {
            Ok(redacted) => (redacted, true),
            Err(err @ RedactError::Parse(_)) => {
                tracing::debug!(error = %err, path = %req.path(), "Storing unredacted body");
                (text, false)
            }
            Err(err) => {
                tracing::debug!(error = %err, path = %req.path(), "Dropping body");
                (String::new(), false)
            }
        }
    }

    fn capture_params(req: &Request, config: &InspectorConfig) -> (ParamMap, Option<MultipartMeta>) {
        let mut post_params = match req.form_params() {
            Ok(pairs) => param_map(pairs),
            Err(err) => {
                tracing::debug!(error = %err, path = %req.path(), "Ignoring url-encoded form");
                ParamMap::new()
            }
        };

        let multipart = match req.multipart_form(config.multipart_max_memory) {
            Ok(form) => form.map(|form| MultipartMeta::from(&form)),
            Err(err) => {
                tracing::debug!(error = %err, path = %req.path(), "Ignoring multipart form");
                None
            }
        };

        if let Some(meta) = &multipart {
            for (name, values) in &meta.value {
                post_params
                    .entry(name.clone())
                    .or_default()
                    .extend(values.iter().cloned());
            }
        }

        (post_params, multipart)
    }

    fn header_map(headers: &HeaderMap) -> ParamMap {
        param_map(headers.iter().map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        }))
    }
}

impl Default for InspectorLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareLayer for InspectorLayer {
    fn call(&self, mut req: Request, next: BoxedNext) -> BoxFuture {
        let config = self.config.clone();
        let log = self.log.clone();

        Box::pin(async move {
            if req.path() == config.endpoint {
                return InspectorLayer::inspection_response(&req, &config, &log);
            }

            if config.should_skip_path(req.path()) {
                return next(req).await;
            }

            let requested_at = Utc::now();

            let is_json = req
                .content_type()
                .is_some_and(|ct| ct.eq_ignore_ascii_case("application/json"));
            let (body, body_redacted) = if is_json {
                InspectorLayer::capture_json_body(&mut req, &config)
            } else {
                (String::new(), true)
            };

            let (post_params, post_multipart) = InspectorLayer::capture_params(&req, &config);
            let request_url = req.path().to_string();
            let http_method = req.method().to_string();
            let client_ip = req.client_ip();
            let get_params = param_map(req.query_pairs());
            let cookies = param_map(req.cookies());
            let headers = InspectorLayer::header_map(req.headers());

            let response = next(req).await;

            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|ct| media_type(ct).to_string())
                .unwrap_or_default();

            log.prepend(RequestSnapshot {
                requested_at,
                request_url,
                http_method,
                http_status: response.status().as_u16(),
                content_type,
                get_params,
                post_params,
                post_multipart,
                body,
                body_redacted,
                client_ip,
                cookies,
                headers,
            });

            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}
