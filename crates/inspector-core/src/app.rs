//! Application builder

use crate::middleware::{LayerStack, MiddlewareLayer};
use crate::router::{Handler, Router};
use crate::server::Server;
use http::Method;

/// Default request body limit: 10MB
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Application builder: routes, middleware and serving
///
/// # Example
///
/// ```rust,ignore
/// use inspector_core::{App, Request};
///
/// async fn hello(_req: Request) -> &'static str {
///     "Hello, World!"
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     App::new()
///         .get("/", hello)
///         .run("127.0.0.1:8080")
///         .await
/// }
/// ```
#[derive(Clone)]
pub struct App {
    router: Router,
    layers: LayerStack,
    body_limit: usize,
}

impl App {
    /// Create an application with no routes and no middleware
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            layers: LayerStack::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Register a handler for a method and path
    pub fn route<H: Handler>(mut self, path: &str, method: Method, handler: H) -> Self {
        self.router = self.router.route(path, method, handler);
        self
    }

    /// Register a GET handler
    pub fn get<H: Handler>(self, path: &str, handler: H) -> Self {
        self.route(path, Method::GET, handler)
    }

    /// Register a POST handler
    pub fn post<H: Handler>(self, path: &str, handler: H) -> Self {
        self.route(path, Method::POST, handler)
    }

    /// Add a middleware layer
    ///
    /// Layers run in the order they are added (first added is outermost).
    pub fn layer<L: MiddlewareLayer>(mut self, layer: L) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Set the maximum buffered request body size in bytes
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Configured body limit
    pub fn get_body_limit(&self) -> usize {
        self.body_limit
    }

    /// Split into router and middleware stack
    pub fn into_parts(self) -> (Router, LayerStack) {
        (self.router, self.layers)
    }

    /// Bind `addr` and serve until the process stops
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let body_limit = self.body_limit;
        let (router, layers) = self.into_parts();
        Server::new(router, layers, body_limit).run(addr).await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
