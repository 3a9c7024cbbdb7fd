//! Relay configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! provider = "github"
//! key_strategy = "discriminator"
//! strip_markers = ["_url"]
//! emit_unhandled = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::KeyStrategy;
use crate::domain::ConfigError;
use crate::flatten::DEFAULT_DELIMITER;

/// Provider prefix used when none is configured.
pub const DEFAULT_PROVIDER: &str = "github";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// First segment of every published event name.
    pub provider: String,

    /// How the classifier picks the event key.
    pub key_strategy: KeyStrategy,

    /// Path delimiter for field stripping.
    pub delimiter: String,

    /// Published payload fields whose path contains any of these are removed.
    pub strip_markers: Vec<String>,

    /// Publish unhandled events with a `null` payload instead of only logging them.
    pub emit_unhandled: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            key_strategy: KeyStrategy::default(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            strip_markers: Vec::new(),
            emit_unhandled: false,
        }
    }
}

impl RelayConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("provider must not be empty".into()));
        }
        if self.provider.contains('.') {
            return Err(ConfigError::Invalid(format!(
                "provider {:?} must not contain '.'",
                self.provider
            )));
        }
        if self.delimiter.is_empty() {
            return Err(ConfigError::Invalid("delimiter must not be empty".into()));
        }
        if self.strip_markers.iter().any(|m| m.is_empty()) {
            return Err(ConfigError::Invalid(
                "strip_markers must not contain empty markers".into(),
            ));
        }
        Ok(())
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = strategy;
        self
    }

    pub fn with_strip_marker(mut self, marker: impl Into<String>) -> Self {
        self.strip_markers.push(marker.into());
        self
    }

    pub fn with_emit_unhandled(mut self, emit: bool) -> Self {
        self.emit_unhandled = emit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        let config = RelayConfig::from_toml_str("").expect("parse");
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.provider, "github");
        assert_eq!(config.key_strategy, KeyStrategy::FirstField);
    }

    #[test]
    fn parses_all_fields() {
        let config = RelayConfig::from_toml_str(
            r#"
            provider = "gitea"
            key_strategy = "discriminator"
            delimiter = "/"
            strip_markers = ["_url", "node_id"]
            emit_unhandled = true
            "#,
        )
        .expect("parse");
        assert_eq!(config.provider, "gitea");
        assert_eq!(config.key_strategy, KeyStrategy::Discriminator);
        assert_eq!(config.delimiter, "/");
        assert_eq!(config.strip_markers, vec!["_url", "node_id"]);
        assert!(config.emit_unhandled);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = RelayConfig::from_toml_str("provdier = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_provider_is_invalid() {
        let err = RelayConfig::from_toml_str("provider = \" \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn dotted_provider_is_invalid() {
        assert!(RelayConfig::default().with_provider("git.hub").validate().is_err());
    }

    #[test]
    fn empty_marker_is_invalid() {
        let config = RelayConfig::default().with_strip_marker("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "emit_unhandled = true").expect("write");
        let config = RelayConfig::load(file.path()).expect("load");
        assert!(config.emit_unhandled);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = RelayConfig::load("/nonexistent/hookrelay.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/hookrelay.toml"));
    }
}
