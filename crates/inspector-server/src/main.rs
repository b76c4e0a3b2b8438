//! Demo server with the traffic inspector mounted.
//!
//! ```text
//! INSPECTOR_SENSITIVE_KEYS=password,token cargo run -p inspector-server
//! curl -X POST localhost:8080/login -H 'content-type: application/json' \
//!      -d '{"user":"alice","password":"hunter2"}'
//! curl 'localhost:8080/inspector?page=1&per_page=10'
//! ```

mod config;

use config::ServerConfig;
use http::StatusCode;
use inspector::InspectorLayer;
use inspector_core::{App, Json, Request, TracingLayer};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn hello(_req: Request) -> &'static str {
    "Hello, World!"
}

async fn echo(mut req: Request) -> String {
    let body = req.take_body().unwrap_or_default();
    String::from_utf8_lossy(&body).into_owned()
}

async fn login(req: Request) -> (StatusCode, Json<Value>) {
    let user = req
        .body()
        .and_then(|b| serde_json::from_slice::<Value>(b).ok())
        .and_then(|v| v.get("user").and_then(Value::as_str).map(str::to_string));

    match user {
        Some(user) => (StatusCode::OK, Json(json!({ "user": user, "token": "demo-token" }))),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "expected a JSON body with a user field" })),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let dotenv = config::load_dotenv();
    let config = ServerConfig::from_env()?;
    let environment = config.environment();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(environment.default_log_level())),
        )
        .init();

    if let Err(err) = dotenv {
        tracing::warn!("Failed to load .env file: {}", err);
    }

    let inspector = InspectorLayer::with_config(config.inspector_config());
    if environment.is_production() {
        tracing::warn!(
            endpoint = %config.endpoint,
            "Inspection endpoint has no authentication; keep it off public networks"
        );
    }
    info!(
        env = %environment,
        endpoint = %config.endpoint,
        sensitive_keys = config.sensitive_keys.len(),
        max_entries = ?config.max_entries,
        "Recording traffic"
    );

    App::new()
        .layer(TracingLayer::new().with_field("service", "inspector-server"))
        .layer(inspector)
        .get("/hello", hello)
        .post("/echo", echo)
        .post("/login", login)
        .run(&config.addr)
        .await
}
