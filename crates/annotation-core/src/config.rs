//! Maintainer configuration.
//!
//! Configuration is plain data with sensible defaults; hosts usually embed it in their own
//! settings file and load it with [`MaintainerConfig::from_yaml_str`].

use crate::render::Syntax;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("invalid value for '{field}': {message}")]
    /// A field had an unusable value.
    Invalid {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Settings of [`AnnotationMaintainer`](crate::AnnotationMaintainer).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaintainerConfig {
    /// Syntax used by [`update_annotations`](crate::AnnotationMaintainer::update_annotations).
    pub default_syntax: Syntax,
    /// Whether a successful uniqueness expansion is widened to whole words.
    pub snap_to_word_boundaries: bool,
    /// Edit-distance limit for the default differ (`None` = unbounded).
    pub diff_max_cost: Option<usize>,
}

impl Default for MaintainerConfig {
    fn default() -> Self {
        Self {
            default_syntax: Syntax::new(Syntax::XWIKI_2_1),
            snap_to_word_boundaries: true,
            diff_max_cost: None,
        }
    }
}

impl MaintainerConfig {
    /// Parse configuration from YAML. Missing keys keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_syntax.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "default_syntax",
                message: "must not be empty".to_string(),
            });
        }
        if self.diff_max_cost == Some(0) {
            return Err(ConfigError::Invalid {
                field: "diff_max_cost",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
