//! TOML-based configuration for fuzzy rerere.
//!
//! Only the matching and reconstruction knobs are configurable. Values load
//! from a TOML file and can be overridden on the command line; both apply
//! uniformly to extraction and matching within one invocation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;

/// Name of the config file looked up inside the record store directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RerereConfig {
    /// Conflict extraction and similarity matching.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Resolution reconstruction policy.
    #[serde(default)]
    pub reconstruct: ReconstructConfig,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Conflict extraction and matching settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchingConfig {
    /// Minimum context similarity (0.0 - 1.0) for a stored resolution to be
    /// replayed. A score equal to the threshold is accepted.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Lines of context captured before and after each conflict region.
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

fn default_similarity_threshold() -> f64 {
    0.8
}
fn default_context_lines() -> usize {
    2
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            context_lines: default_context_lines(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

/// Policy for locating a resolution's extent in the resolved file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconstructConfig {
    /// Consecutive matching lines needed before the resolved file is
    /// considered back in sync with the snapshot.
    #[serde(default = "default_resync_lines")]
    pub resync_lines: usize,

    /// Whether blank lines count towards `resync_lines`.
    #[serde(default)]
    pub count_blank_lines: bool,
}

fn default_resync_lines() -> usize {
    3
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            resync_lines: default_resync_lines(),
            count_blank_lines: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl RerereConfig {
    /// Load a [`RerereConfig`] from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: RerereConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!(?config, "configuration parsed successfully");
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate that all values are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.matching.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue {
                field: "matching.similarity_threshold".into(),
                detail: format!("must be between 0.0 and 1.0, got {}", threshold),
            });
        }
        if self.reconstruct.resync_lines == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconstruct.resync_lines".into(),
                detail: "at least one matching line is required to resynchronize".into(),
            });
        }
        Ok(())
    }

    /// Generate a default TOML config template string.
    pub fn default_template() -> &'static str {
        r#"# git-fuzzy-rerere configuration

[matching]
# Minimum context similarity (0.0 - 1.0) for a stored resolution to be reused.
similarity_threshold = 0.8
# Lines of context captured before and after each conflict.
context_lines = 2

[reconstruct]
# Consecutive unchanged lines that mark the end of a resolution.
resync_lines = 3
count_blank_lines = false
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: RerereConfig = toml::from_str("").unwrap();
        assert_eq!(config.matching.similarity_threshold, 0.8);
        assert_eq!(config.matching.context_lines, 2);
        assert_eq!(config.reconstruct.resync_lines, 3);
        assert!(!config.reconstruct.count_blank_lines);
        assert_eq!(config, RerereConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config: RerereConfig = toml::from_str(
            r#"
[matching]
context_lines = 4
"#,
        )
        .unwrap();
        assert_eq!(config.matching.context_lines, 4);
        assert_eq!(config.matching.similarity_threshold, 0.8);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[matching]\nsimilarity_threshold = 0.5\n").unwrap();

        let config = RerereConfig::load_from_file(&path).expect("load failed");
        assert_eq!(config.matching.similarity_threshold, 0.5);
    }

    #[test]
    fn test_file_not_found() {
        let result = RerereConfig::load_from_file("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = RerereConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, RerereConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[matching\n").unwrap();
        let result = RerereConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = RerereConfig::default();
        config.matching.similarity_threshold = 1.5;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "matching.similarity_threshold"
        ));

        config.matching.similarity_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_resync_lines() {
        let mut config = RerereConfig::default();
        config.reconstruct.resync_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_template_is_valid() {
        let config: RerereConfig = toml::from_str(RerereConfig::default_template())
            .expect("default template should be valid TOML");
        assert_eq!(config, RerereConfig::default());
        config.validate().unwrap();
    }
}
