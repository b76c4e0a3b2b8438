use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use inspector_core::{
    BoxFuture, BoxedNext, IntoResponse, LayerStack, MiddlewareLayer, Request, Router,
    TracingLayer,
};

/// Uppercases a JSON body before the handler runs and tags the response.
#[derive(Clone)]
struct RewriteBody;

impl MiddlewareLayer for RewriteBody {
    fn call(&self, mut req: Request, next: BoxedNext) -> BoxFuture {
        Box::pin(async move {
            if let Some(body) = req.take_body() {
                let upper = String::from_utf8_lossy(&body).to_uppercase();
                req.set_body(Bytes::from(upper));
            }
            let mut response = next(req).await;
            response
                .headers_mut()
                .insert("x-rewritten", http::HeaderValue::from_static("1"));
            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

async fn echo(mut req: Request) -> String {
    let body = req.take_body().unwrap_or_default();
    String::from_utf8_lossy(&body).into_owned()
}

async fn fail(_req: Request) -> impl IntoResponse {
    inspector_core::ApiError::bad_request("nope")
}

fn request(method: Method, uri: &str, body: &'static str) -> Request {
    Request::from_http(
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap(),
    )
}

async fn body_text(response: inspector_core::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[tokio::test]
async fn test_layers_wrap_router() {
    let router = Router::new()
        .route("/echo", Method::POST, echo)
        .route("/fail", Method::GET, fail);
    let handler = router.into_handler();

    let mut stack = LayerStack::new();
    stack.push(Box::new(TracingLayer::new()));
    stack.push(Box::new(RewriteBody));

    let response = stack
        .execute(request(Method::POST, "/echo", "quiet"), handler.clone())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-rewritten").unwrap(), "1");
    assert_eq!(body_text(response).await, "QUIET");

    let response = stack.execute(request(Method::GET, "/fail", ""), handler.clone()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(error["error"]["message"], "nope");

    // unrouted requests still pass through every layer
    let response = stack.execute(request(Method::GET, "/nowhere", ""), handler).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers().get("x-rewritten").unwrap(), "1");
}
