//! Settings structures for Typeahead-RS configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching typeahead.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub autocomplete: AutocompleteConfig,
    pub source: SourceSettings,
    pub outgoing: OutgoingSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (TYPEAHEAD_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge values from an arbitrary variable lookup
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("TYPEAHEAD_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = lookup("TYPEAHEAD_LOG") {
            self.general.log_filter = val;
        }
        if let Some(Ok(min_length)) = lookup("TYPEAHEAD_MIN_LENGTH").map(|v| v.parse::<usize>()) {
            self.autocomplete.min_length = min_length;
        }
        if let Some(Ok(debounce_ms)) = lookup("TYPEAHEAD_DEBOUNCE_MS").map(|v| v.parse::<u64>()) {
            self.autocomplete.debounce_ms = debounce_ms;
        }
        if let Some(Ok(max_visible)) = lookup("TYPEAHEAD_MAX_VISIBLE").map(|v| v.parse::<usize>()) {
            self.autocomplete.max_visible = max_visible;
        }
        if let Some(val) = lookup("TYPEAHEAD_ENDPOINT") {
            self.source.kind = SourceKind::Http;
            self.source.endpoint = Some(val);
        }
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug mode (verbose logging)
    pub debug: bool,
    /// Log filter directive, overridden by RUST_LOG
    pub log_filter: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            log_filter: "info".to_string(),
        }
    }
}

/// Autocomplete widget configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteConfig {
    /// Minimum characters before searching
    pub min_length: usize,
    /// Debounce delay for keystrokes in milliseconds
    pub debounce_ms: u64,
    /// Maximum suggestions displayed; 0 shows all. Does not affect lookups.
    pub max_visible: usize,
    /// Placeholder text for the input
    pub placeholder: String,
    /// Initial value of the input
    pub initial_input: String,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            min_length: 2,
            debounce_ms: 300,
            max_visible: 8,
            placeholder: "Search…".to_string(),
            initial_input: String::new(),
        }
    }
}

impl AutocompleteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Which suggestion source the demo binary wires up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Built-in country table with simulated latency
    #[default]
    Countries,
    /// JSON endpoint over HTTP
    Http,
}

/// Suggestion source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub kind: SourceKind,
    /// Endpoint URL for the HTTP source
    pub endpoint: Option<String>,
    /// Query-string parameter carrying the query
    pub query_param: String,
    /// Simulated latency bounds for the country source (ms)
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::Countries,
            endpoint: None,
            query_param: "query".to_string(),
            min_latency_ms: 150,
            max_latency_ms: 600,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// User agent header
    pub user_agent: String,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 5.0,
            user_agent: format!("typeahead-rs/{}", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.autocomplete.min_length, 2);
        assert_eq!(settings.autocomplete.debounce_ms, 300);
        assert_eq!(settings.autocomplete.max_visible, 8);
        assert_eq!(settings.source.kind, SourceKind::Countries);
        assert!(!settings.general.debug);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
autocomplete:
  debounce_ms: 120
  placeholder: "Search countries…"
source:
  kind: http
  endpoint: "http://localhost:8080/api/countries"
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.autocomplete.debounce_ms, 120);
        assert_eq!(settings.autocomplete.min_length, 2);
        assert_eq!(settings.autocomplete.placeholder, "Search countries…");
        assert_eq!(settings.source.kind, SourceKind::Http);
        assert_eq!(settings.source.query_param, "query");
        assert_eq!(settings.outgoing.request_timeout, 5.0);
    }

    #[test]
    fn test_merge_vars() {
        let mut settings = Settings::default();
        settings.merge_vars(|key| match key {
            "TYPEAHEAD_MIN_LENGTH" => Some("3".to_string()),
            "TYPEAHEAD_DEBOUNCE_MS" => Some("not a number".to_string()),
            "TYPEAHEAD_ENDPOINT" => Some("http://example.test/s".to_string()),
            _ => None,
        });

        assert_eq!(settings.autocomplete.min_length, 3);
        assert_eq!(settings.autocomplete.debounce_ms, 300);
        assert_eq!(settings.source.kind, SourceKind::Http);
        assert_eq!(settings.source.endpoint.as_deref(), Some("http://example.test/s"));
    }
}
