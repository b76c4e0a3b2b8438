//! Captured request records

use chrono::{DateTime, Utc};
use inspector_core::{FilePart, MultipartForm};
use serde::Serialize;
use std::collections::BTreeMap;

/// Name to values mapping used for headers, cookies and parameters
///
/// Keys serialize in sorted order; values keep arrival order.
pub type ParamMap = BTreeMap<String, Vec<String>>;

/// Group `(name, value)` pairs into a [`ParamMap`]
pub fn param_map<I, K, V>(pairs: I) -> ParamMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut map = ParamMap::new();
    for (k, v) in pairs {
        map.entry(k.into()).or_default().push(v.into());
    }
    map
}

/// Metadata of one uploaded file; the content itself is never kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMeta {
    /// Client-supplied file name
    pub filename: String,
    /// Declared part content type, empty when absent
    pub content_type: String,
    /// Content length in bytes
    pub size: usize,
}

impl From<&FilePart> for FileMeta {
    fn from(part: &FilePart) -> Self {
        Self {
            filename: part.file_name.clone(),
            content_type: part.content_type.clone().unwrap_or_default(),
            size: part.size,
        }
    }
}

/// Parsed `multipart/form-data` fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MultipartMeta {
    /// Plain field values
    pub value: ParamMap,
    /// File metadata per field name
    pub file: BTreeMap<String, Vec<FileMeta>>,
}

impl From<&MultipartForm> for MultipartMeta {
    fn from(form: &MultipartForm) -> Self {
        let mut file: BTreeMap<String, Vec<FileMeta>> = BTreeMap::new();
        for part in &form.files {
            file.entry(part.field.clone()).or_default().push(part.into());
        }
        Self {
            value: param_map(form.values.iter().cloned()),
            file,
        }
    }
}

/// One recorded request/response exchange
///
/// Snapshots are built once, after the downstream handler finished, and
/// are shared read-only from then on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    pub requested_at: DateTime<Utc>,
    pub request_url: String,
    pub http_method: String,
    pub http_status: u16,
    /// Response media type without parameters
    pub content_type: String,
    pub get_params: ParamMap,
    pub post_params: ParamMap,
    pub post_multipart: Option<MultipartMeta>,
    /// Redacted JSON text, or empty for non-JSON requests
    pub body: String,
    /// False when a JSON body could not be redacted; `body` then holds the
    /// raw text if it was malformed, or nothing
    pub body_redacted: bool,
    pub client_ip: String,
    pub cookies: ParamMap,
    pub headers: ParamMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_param_map_groups_repeated_names() {
        let map = param_map([("b", "1"), ("a", "2"), ("b", "3")]);
        assert_eq!(map["b"], vec!["1", "3"]);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_multipart_meta_from_form() {
        let form = MultipartForm {
            values: vec![("title".into(), "report".into())],
            files: vec![FilePart {
                field: "upload".into(),
                file_name: "a.txt".into(),
                content_type: None,
                size: 12,
            }],
        };

        let meta = MultipartMeta::from(&form);
        assert_eq!(meta.value["title"], vec!["report"]);
        assert_eq!(
            meta.file["upload"],
            vec![FileMeta {
                filename: "a.txt".into(),
                content_type: String::new(),
                size: 12
            }]
        );
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = RequestSnapshot {
            requested_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            request_url: "/login".into(),
            http_method: "POST".into(),
            http_status: 200,
            content_type: "application/json".into(),
            get_params: ParamMap::new(),
            post_params: ParamMap::new(),
            post_multipart: None,
            body: r#"{"password":"REDACTED"}"#.into(),
            body_redacted: true,
            client_ip: "127.0.0.1".into(),
            cookies: param_map([("sid", "x")]),
            headers: param_map([("content-type", "application/json")]),
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["requested_at"], "2024-05-01T12:00:00Z");
        assert_eq!(json["http_status"], 200);
        assert_eq!(json["body_redacted"], true);
        assert_eq!(json["post_multipart"], serde_json::Value::Null);
        assert_eq!(json["cookies"]["sid"][0], "x");
        assert_eq!(json["headers"]["content-type"][0], "application/json");
    }
}
