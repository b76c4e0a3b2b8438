//! Middleware chain primitives
//!
//! A middleware receives the request plus a `next` continuation. Awaiting
//! `next(req)` runs every inner layer and the final handler to completion,
//! so the returned response carries the final status.

use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future produced by a middleware or handler
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A boxed next function for middleware chains
pub type BoxedNext = Arc<dyn Fn(Request) -> BoxFuture + Send + Sync>;

/// Trait for middleware applied around the handler
pub trait MiddlewareLayer: Send + Sync + 'static {
    /// Apply this middleware to a request, calling `next` to continue the chain
    fn call(&self, req: Request, next: BoxedNext) -> BoxFuture;

    /// Clone this middleware into a boxed trait object
    fn clone_box(&self) -> Box<dyn MiddlewareLayer>;
}

impl Clone for Box<dyn MiddlewareLayer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A stack of middleware layers
#[derive(Clone, Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn MiddlewareLayer>>,
}

impl LayerStack {
    /// Create a new empty layer stack
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a middleware layer to the stack
    ///
    /// Layers run in the order they are added (outermost first).
    pub fn push(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.push(layer);
    }

    /// Execute the middleware stack with a final handler
    pub fn execute(&self, req: Request, handler: BoxedNext) -> BoxFuture {
        if self.layers.is_empty() {
            return handler(req);
        }

        // Build the chain from the inside out
        let mut next = handler;
        for layer in self.layers.iter().rev() {
            let layer: Arc<dyn MiddlewareLayer> = Arc::from(layer.clone_box());
            let inner = next;
            next = Arc::new(move |req: Request| layer.call(req, inner.clone()));
        }

        next(req)
    }
}
