//! HTTP server implementation

use crate::error::ApiError;
use crate::middleware::{BoxedNext, LayerStack};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;
use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Internal server struct
pub(crate) struct Server {
    handler: BoxedNext,
    layers: Arc<LayerStack>,
    body_limit: usize,
}

impl Server {
    pub fn new(router: Router, layers: LayerStack, body_limit: usize) -> Self {
        Self {
            handler: router.into_handler(),
            layers: Arc::new(layers),
            body_limit,
        }
    }

    /// Run the server
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Inspector server running on http://{}", addr);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let handler = self.handler.clone();
            let layers = self.layers.clone();
            let body_limit = self.body_limit;

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let handler = handler.clone();
                    let layers = layers.clone();
                    async move {
                        let response =
                            handle_request(handler, layers, body_limit, req, remote_addr).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Connection error: {}", err);
                }
            });
        }
    }
}

/// Buffer the body, then run the middleware stack and router
async fn handle_request(
    handler: BoxedNext,
    layers: Arc<LayerStack>,
    body_limit: usize,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let (parts, body) = req.into_parts();
    let body = match read_body(body, body_limit).await {
        Ok(body) => body,
        Err(err) => {
            let response = err.into_response();
            log_request(&method, &path, response.status(), start);
            return response;
        }
    };

    let request = Request::new(parts, body).with_remote_addr(remote_addr);
    let response = layers.execute(request, handler).await;

    log_request(&method, &path, response.status(), start);
    response
}

async fn read_body(body: Incoming, limit: usize) -> Result<Bytes, ApiError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => Err(
            ApiError::payload_too_large(format!("Request body exceeds limit of {} bytes", limit)),
        ),
        Err(err) => Err(ApiError::bad_request("Failed to read request body")
            .with_internal(err.to_string())),
    }
}

/// Log request completion
fn log_request(method: &http::Method, path: &str, status: StatusCode, start: std::time::Instant) {
    let elapsed = start.elapsed();

    if status.is_success() {
        info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    } else {
        error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    }
}
