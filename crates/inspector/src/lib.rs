//! # Inspector
//!
//! In-process HTTP traffic recorder. [`InspectorLayer`] sits in an
//! `inspector_core` middleware stack, records a redacted [`RequestSnapshot`]
//! of every exchange into a newest-first [`RequestLog`], and serves that log
//! page by page on a reserved endpoint.
//!
//! ```ignore
//! use inspector::{InspectorConfig, InspectorLayer};
//! use inspector_core::App;
//!
//! App::new()
//!     .layer(InspectorLayer::with_config(
//!         InspectorConfig::new()
//!             .endpoint("/inspector")
//!             .sensitive_keys(["password", "token"]),
//!     ))
//!     .post("/login", login)
//!     .run("127.0.0.1:8080")
//!     .await
//! ```
//!
//! `GET /inspector?page=2&per_page=20` then returns the second page of
//! twenty recorded requests.

mod config;
mod layer;
pub mod paginate;
pub mod redact;
mod snapshot;
mod store;

pub use config::{InspectorConfig, DEFAULT_ENDPOINT};
pub use layer::InspectorLayer;
pub use paginate::{paginate, PageQuery, PaginationView};
pub use redact::{redact, redact_document, redact_value, RedactError, SensitiveKeys, REDACTED};
pub use snapshot::{param_map, FileMeta, MultipartMeta, ParamMap, RequestSnapshot};
pub use store::RequestLog;
