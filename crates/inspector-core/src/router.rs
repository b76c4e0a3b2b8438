//! Exact-path router
//!
//! Routes are keyed by the literal request path and HTTP method. Unknown
//! paths answer 404, known paths with an unregistered method answer 405 with
//! an `Allow` header.

use crate::error::ApiError;
use crate::middleware::{BoxFuture, BoxedNext};
use crate::request::Request;
use crate::response::IntoResponse;
use http::{header, HeaderValue, Method};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// An async function usable as a route handler
pub trait Handler: Clone + Send + Sync + 'static {
    /// Run the handler for one request
    fn call(&self, req: Request) -> BoxFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Outcome of matching a request against the route table
pub enum RouteMatch<'a> {
    /// A handler is registered for the path and method
    Found(&'a BoxedNext),
    /// No route has this path
    NotFound,
    /// The path exists but not for this method
    MethodNotAllowed {
        /// Methods registered for the path
        allowed: Vec<Method>,
    },
}

/// Route table
#[derive(Clone, Default)]
pub struct Router {
    routes: HashMap<String, HashMap<Method, BoxedNext>>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` on `path`
    pub fn route<H: Handler>(mut self, path: &str, method: Method, handler: H) -> Self {
        let boxed: BoxedNext = Arc::new(move |req: Request| handler.call(req));
        self.routes
            .entry(path.to_string())
            .or_default()
            .insert(method, boxed);
        self
    }

    /// Number of registered (path, method) pairs
    pub fn len(&self) -> usize {
        self.routes.values().map(|m| m.len()).sum()
    }

    /// Check if no route is registered
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Match a path and method
    pub fn match_route(&self, path: &str, method: &Method) -> RouteMatch<'_> {
        match self.routes.get(path) {
            None => RouteMatch::NotFound,
            Some(methods) => match methods.get(method) {
                Some(handler) => RouteMatch::Found(handler),
                None => {
                    let mut allowed: Vec<Method> = methods.keys().cloned().collect();
                    allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                    RouteMatch::MethodNotAllowed { allowed }
                }
            },
        }
    }

    /// Turn the router into the innermost handler of a middleware chain
    pub fn into_handler(self) -> BoxedNext {
        let router = Arc::new(self);
        Arc::new(move |req: Request| {
            let router = router.clone();
            Box::pin(async move { router.dispatch(req).await }) as BoxFuture
        })
    }

    async fn dispatch(&self, req: Request) -> crate::response::Response {
        let method = req.method().clone();
        let path = req.path().to_string();

        match self.match_route(&path, &method) {
            RouteMatch::Found(handler) => handler(req).await,
            RouteMatch::NotFound => {
                ApiError::not_found(format!("No route found for {} {}", method, path))
                    .into_response()
            }
            RouteMatch::MethodNotAllowed { allowed } => {
                let allowed = allowed
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut response = ApiError::method_not_allowed(format!(
                    "Method {} not allowed for {}",
                    method, path
                ))
                .into_response();
                if let Ok(value) = HeaderValue::from_str(&allowed) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                response
            }
        }
    }
}
