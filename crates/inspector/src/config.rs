//! Configuration for the InspectorLayer middleware.

use crate::redact::SensitiveKeys;
use inspector_core::form::DEFAULT_MULTIPART_MAX_MEMORY;
use std::collections::HashSet;

/// Path serving the recorded requests unless configured otherwise
pub const DEFAULT_ENDPOINT: &str = "/inspector";

/// Configuration for the [`InspectorLayer`](crate::InspectorLayer).
///
/// ```ignore
/// use inspector::InspectorConfig;
///
/// let config = InspectorConfig::new()
///     .endpoint("/_debug/requests")
///     .sensitive_keys(["password", "token"])
///     .max_entries(Some(5_000))
///     .skip_path("/health");
/// ```
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    pub(crate) endpoint: String,
    pub(crate) multipart_max_memory: usize,
    pub(crate) sensitive_keys: SensitiveKeys,
    pub(crate) max_entries: Option<usize>,
    pub(crate) skip_paths: HashSet<String>,
    pub(crate) skip_path_prefixes: HashSet<String>,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl InspectorConfig {
    /// Create a configuration with default values.
    ///
    /// Defaults:
    /// - Endpoint at "/inspector"
    /// - Multipart value budget: 32MB
    /// - No sensitive keys
    /// - Unbounded log
    /// - No paths skipped
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            multipart_max_memory: DEFAULT_MULTIPART_MAX_MEMORY,
            sensitive_keys: SensitiveKeys::default(),
            max_entries: None,
            skip_paths: HashSet::new(),
            skip_path_prefixes: HashSet::new(),
        }
    }

    /// Set the inspection endpoint path.
    pub fn endpoint(mut self, path: impl Into<String>) -> Self {
        self.endpoint = path.into();
        self
    }

    /// Set the memory budget for multipart field values.
    pub fn multipart_max_memory(mut self, bytes: usize) -> Self {
        self.multipart_max_memory = bytes;
        self
    }

    /// Replace the set of JSON keys whose values are redacted.
    pub fn sensitive_keys(mut self, keys: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.sensitive_keys = SensitiveKeys::new(keys);
        self
    }

    /// Add one sensitive key.
    pub fn sensitive_key(mut self, key: impl AsRef<str>) -> Self {
        self.sensitive_keys.insert(key.as_ref());
        self
    }

    /// Bound the log; `None` keeps every request.
    pub fn max_entries(mut self, max: Option<usize>) -> Self {
        self.max_entries = max;
        self
    }

    /// Never record requests on this exact path.
    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.skip_paths.insert(path.into());
        self
    }

    /// Never record requests whose path starts with `prefix`.
    pub fn skip_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.skip_path_prefixes.insert(prefix.into());
        self
    }

    /// Inspection endpoint path.
    pub fn get_endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Configured sensitive keys.
    pub fn get_sensitive_keys(&self) -> &SensitiveKeys {
        &self.sensitive_keys
    }

    /// Configured log bound.
    pub fn get_max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    pub(crate) fn should_skip_path(&self, path: &str) -> bool {
        self.skip_paths.contains(path)
            || self
                .skip_path_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InspectorConfig::new();
        assert_eq!(config.get_endpoint(), "/inspector");
        assert_eq!(config.multipart_max_memory, 32 * 1024 * 1024);
        assert!(config.get_sensitive_keys().is_empty());
        assert_eq!(config.get_max_entries(), None);
    }

    #[test]
    fn test_sensitive_keys_builder() {
        let config = InspectorConfig::new()
            .sensitive_keys(["Password"])
            .sensitive_key("TOKEN");
        assert!(config.get_sensitive_keys().contains("password"));
        assert!(config.get_sensitive_keys().contains("token"));

        let replaced = config.sensitive_keys(["secret"]);
        assert!(!replaced.get_sensitive_keys().contains("password"));
    }

    #[test]
    fn test_skip_paths() {
        let config = InspectorConfig::new()
            .skip_path("/health")
            .skip_path_prefix("/static/");

        assert!(config.should_skip_path("/health"));
        assert!(config.should_skip_path("/static/app.js"));
        assert!(!config.should_skip_path("/healthz"));
        assert!(!config.should_skip_path("/users"));
    }
}
