//! Sensitive-field redaction for JSON documents
//!
//! Values under configured keys are replaced with [`REDACTED`] at every
//! depth: nested objects, objects inside arrays and arrays of arrays.
//! Keys match case-insensitively.

use serde_json::Value;
use std::collections::BTreeSet;

/// Replacement written over sensitive values
pub const REDACTED: &str = "REDACTED";

/// Deepest nesting of objects and arrays a document may have
///
/// Kept below serde_json's own recursion limit so that depth is always
/// reported as [`RedactError::TooDeep`].
pub const MAX_DEPTH: usize = 100;

/// Errors returned by [`redact`] and [`redact_document`]
#[derive(Debug, thiserror::Error)]
pub enum RedactError {
    /// Input is not valid JSON
    #[error("invalid JSON document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Input nests objects or arrays deeper than [`MAX_DEPTH`]
    #[error("JSON document nests deeper than {MAX_DEPTH} levels")]
    TooDeep,

    /// Input is valid JSON but its root is not an object
    #[error("JSON document root is not an object")]
    NotAnObject,
}

/// Case-insensitive set of field names whose values must never be stored
///
/// ```
/// use inspector::SensitiveKeys;
///
/// let keys = SensitiveKeys::new(["Password", "token"]);
/// assert!(keys.contains("PASSWORD"));
/// assert!(!keys.contains("username"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensitiveKeys {
    keys: BTreeSet<String>,
}

impl SensitiveKeys {
    /// Build a key set; keys are stored lower-cased
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for key in keys {
            set.insert(key.as_ref());
        }
        set
    }

    /// Add one key
    pub fn insert(&mut self, key: &str) {
        self.keys.insert(key.to_lowercase());
    }

    /// Check whether `key` is sensitive, ignoring case
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(&key.to_lowercase())
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no key is configured
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over the lower-cased keys
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for SensitiveKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Redact a JSON object document and re-serialize it
///
/// The root must be an object. The output is compact JSON with object keys
/// in sorted order.
pub fn redact(document: &str, keys: &SensitiveKeys) -> Result<String, RedactError> {
    let mut value = parse(document)?;
    if !value.is_object() {
        return Err(RedactError::NotAnObject);
    }
    redact_value(&mut value, keys);
    Ok(serde_json::to_string(&value)?)
}

/// Redact a JSON document with any root: object, array or scalar
///
/// Documents nested deeper than [`MAX_DEPTH`] are refused with
/// [`RedactError::TooDeep`] before parsing, so a [`RedactError::Parse`]
/// always means the text itself is malformed.
pub fn redact_document(document: &str, keys: &SensitiveKeys) -> Result<String, RedactError> {
    let mut value = parse(document)?;
    redact_value(&mut value, keys);
    Ok(serde_json::to_string(&value)?)
}

fn parse(document: &str) -> Result<Value, RedactError> {
    if nesting_depth(document.as_bytes(), MAX_DEPTH) > MAX_DEPTH {
        return Err(RedactError::TooDeep);
    }
    Ok(serde_json::from_str(document)?)
}

/// Maximum bracket nesting outside string literals, counted up to `limit + 1`
fn nesting_depth(text: &[u8], limit: usize) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &b in text {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                max = max.max(depth);
                if max > limit {
                    return max;
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Redact a JSON value in place
pub fn redact_value(value: &mut Value, keys: &SensitiveKeys) {
    if keys.is_empty() {
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if keys.contains(key) {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    redact_value(v, keys);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_value(item, keys);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn keys() -> SensitiveKeys {
        SensitiveKeys::new(["password", "token"])
    }

    #[test]
    fn test_redacts_every_depth() {
        let input = json!({
            "user": "alice",
            "password": "hunter2",
            "profile": {"settings": {"token": 42, "theme": "dark"}},
            "sessions": [{"token": "a"}, {"id": 1}],
            "matrix": [[{"password": true}]],
            "tags": ["password", "token"]
        })
        .to_string();

        let out: Value = serde_json::from_str(&redact(&input, &keys()).unwrap()).unwrap();

        assert_eq!(out["user"], "alice");
        assert_eq!(out["password"], REDACTED);
        assert_eq!(out["profile"]["settings"]["token"], REDACTED);
        assert_eq!(out["profile"]["settings"]["theme"], "dark");
        assert_eq!(out["sessions"][0]["token"], REDACTED);
        assert_eq!(out["sessions"][1]["id"], 1);
        assert_eq!(out["matrix"][0][0]["password"], REDACTED);
        // scalar array members are values, not keys
        assert_eq!(out["tags"], json!(["password", "token"]));
    }

    #[test]
    fn test_case_insensitive_match() {
        let input = r#"{"Password":"a","PASSWORD":"b","PaSsWoRd":"c","name":"d"}"#;
        let out: Value = serde_json::from_str(&redact(input, &keys()).unwrap()).unwrap();

        assert_eq!(out["Password"], REDACTED);
        assert_eq!(out["PASSWORD"], REDACTED);
        assert_eq!(out["PaSsWoRd"], REDACTED);
        assert_eq!(out["name"], "d");
    }

    #[test]
    fn test_whole_subtree_replaced() {
        let input = r#"{"token":{"access":"x","refresh":"y"}}"#;
        assert_eq!(redact(input, &keys()).unwrap(), r#"{"token":"REDACTED"}"#);
    }

    #[test]
    fn test_rejects_malformed_and_non_objects() {
        assert!(matches!(redact("{not json", &keys()), Err(RedactError::Parse(_))));
        assert!(matches!(redact("[1,2]", &keys()), Err(RedactError::NotAnObject)));
        assert!(matches!(redact("\"text\"", &keys()), Err(RedactError::NotAnObject)));
    }

    #[test]
    fn test_redact_document_accepts_any_root() {
        let out = redact_document(r#"[{"password":"s3cret"},[{"Token":1}],"password"]"#, &keys())
            .unwrap();
        assert_eq!(out, r#"[{"password":"REDACTED"},[{"Token":"REDACTED"}],"password"]"#);
        assert_eq!(redact_document("42", &keys()).unwrap(), "42");
        assert!(matches!(
            redact_document("[1,", &keys()),
            Err(RedactError::Parse(_))
        ));
    }

    #[test]
    fn test_deep_documents_are_refused() {
        let deep = format!("{}{}{}", r#"{"a":"#.repeat(200), r#"{"password":"s3cret"}"#, "}".repeat(200));
        assert!(matches!(redact(&deep, &keys()), Err(RedactError::TooDeep)));
        assert!(matches!(redact_document(&deep, &keys()), Err(RedactError::TooDeep)));

        let shallow = format!("{}1{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(redact_document(&shallow, &keys()).is_ok());
    }

    #[test]
    fn test_nesting_depth_ignores_string_contents() {
        assert_eq!(nesting_depth(br#"{"a":"[[[{{","b":[1]}"#, MAX_DEPTH), 2);
        assert_eq!(nesting_depth(br#"{"a":"\"[["}"#, MAX_DEPTH), 1);
        assert_eq!(nesting_depth(b"[[[[", 2), 3);
    }

    #[test]
    fn test_empty_key_set_leaves_document() {
        let input = r#"{"password":"x"}"#;
        assert_eq!(redact(input, &SensitiveKeys::default()).unwrap(), input);
    }

    fn json_tree() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map(
                    prop_oneof![Just("password".to_string()), Just("Token".to_string()), "[a-z]{1,5}"],
                    inner,
                    0..4
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn has_sensitive_leak(value: &Value, keys: &SensitiveKeys) -> bool {
        match value {
            Value::Object(map) => map.iter().any(|(k, v)| {
                (keys.contains(k) && v != &Value::String(REDACTED.to_string()))
                    || has_sensitive_leak(v, keys)
            }),
            Value::Array(items) => items.iter().any(|v| has_sensitive_leak(v, keys)),
            _ => false,
        }
    }

    proptest! {
        #[test]
        fn prop_no_sensitive_value_survives(tree in json_tree()) {
            let mut value = json!({ "root": tree });
            redact_value(&mut value, &keys());
            prop_assert!(!has_sensitive_leak(&value, &keys()));
        }

        #[test]
        fn prop_redaction_is_idempotent(tree in json_tree()) {
            let mut once = json!({ "root": tree });
            redact_value(&mut once, &keys());
            let mut twice = once.clone();
            redact_value(&mut twice, &keys());
            prop_assert_eq!(once, twice);
        }
    }
}
