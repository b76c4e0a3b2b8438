//! Middleware infrastructure
//!
//! Middleware is added with [`App::layer`](crate::App::layer) and runs for
//! every request, before routing.
//!
//! # Example
//!
//! ```rust,ignore
//! use inspector_core::{App, TracingLayer};
//!
//! App::new()
//!     .layer(TracingLayer::new())
//!     .get("/", handler)
//!     .run("127.0.0.1:8080")
//!     .await
//! ```

mod layer;
mod tracing_layer;

pub use layer::{BoxFuture, BoxedNext, LayerStack, MiddlewareLayer};
pub use tracing_layer::TracingLayer;
