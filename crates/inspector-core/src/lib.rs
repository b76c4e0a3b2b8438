//! # Inspector Core
//!
//! The request pipeline the traffic inspector plugs into: a buffered
//! [`Request`], the [`MiddlewareLayer`] chain, an exact-path [`Router`], the
//! hyper-based server behind [`App::run`], and form/multipart parsing.
//!
//! Use the `inspector` crate for the recorder itself.

mod app;
mod error;
pub mod form;
pub mod middleware;
mod request;
mod response;
mod router;
mod server;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;

// Public API
pub use app::{App, DEFAULT_BODY_LIMIT};
pub use error::{ApiError, Result};
pub use form::{FilePart, FormError, MultipartForm};
pub use middleware::{BoxFuture, BoxedNext, LayerStack, MiddlewareLayer, TracingLayer};
pub use request::{media_type, Request};
pub use response::{IntoResponse, Json, Response};
pub use router::{Handler, RouteMatch, Router};
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};
