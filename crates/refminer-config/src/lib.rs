//! Configuration for the refminer inference engine.
//!
//! Configuration is read from a TOML file (conventionally `refminer.toml`)
//! with two sections: `[detection]`, which switches individual detection
//! passes on or off and bounds the running time of one class-pair diff, and
//! `[logging]`, which drives [`init_tracing`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

mod logging;
mod schema;

pub use logging::{init_tracing, LoggingConfig};
pub use schema::json_schema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DetectionConfig {
    /// Detect operations extracted from a matched operation into an added one.
    #[serde(default = "default_enabled")]
    pub extract_operations: bool,

    /// Second extraction pass whose call sites come from the statements of
    /// other matched operations.
    #[serde(default = "default_enabled")]
    pub extract_with_calls_in_other_mappers: bool,

    /// Detect removed operations inlined into a matched operation.
    #[serde(default = "default_enabled")]
    pub inline_operations: bool,

    /// Detect removed operations inlined into operations that were themselves
    /// extracted.
    #[serde(default = "default_enabled")]
    pub inline_into_extracted_operations: bool,

    /// Resolve attribute, enum constant and variable renames.
    #[serde(default = "default_enabled")]
    pub attribute_renames: bool,

    /// Resolve attribute merges and splits.
    #[serde(default = "default_enabled")]
    pub attribute_merges_and_splits: bool,

    /// Wall-clock budget for one class-pair diff. Unset means unbounded.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl DetectionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            extract_operations: true,
            extract_with_calls_in_other_mappers: true,
            inline_operations: true,
            inline_into_extracted_operations: true,
            attribute_renames: true,
            attribute_merges_and_splits: true,
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RefminerConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

impl RefminerConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::load_from_str(&text)?;
        tracing::debug!(target: "refminer.config", path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load a config from a TOML string.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: RefminerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks that the TOML types alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detection.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "detection.timeout_ms",
                message: "must be greater than zero; omit it to disable the timeout".to_owned(),
            });
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "logging.level",
                message: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_yields_defaults() {
        let config = RefminerConfig::load_from_str("").expect("config should parse");
        assert_eq!(config, RefminerConfig::default());
        assert!(config.detection.extract_operations);
        assert_eq!(config.detection.timeout(), None);
    }

    #[test]
    fn sections_are_read() {
        let text = r#"
[detection]
inline_operations = false
timeout_ms = 2500

[logging]
level = "debug"
json = true
"#;
        let config = RefminerConfig::load_from_str(text).expect("config should parse");
        assert!(!config.detection.inline_operations);
        assert!(config.detection.extract_operations);
        assert_eq!(config.detection.timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert!(config.logging.stderr);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RefminerConfig::load_from_str("[detection]\nextract = true\n")
            .expect_err("unknown key should fail");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let err = RefminerConfig::load_from_str("[detection]\ntimeout_ms = 0\n")
            .expect_err("zero timeout should fail");
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "detection.timeout_ms"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
