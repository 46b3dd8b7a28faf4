//! Scraper configuration
//!
//! Loaded from TOML. Every section has defaults, so an empty file is a valid
//! configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};
use crate::expand::ExpansionConfig;
use crate::field::FieldSet;
use crate::profile;

/// Where extraction snapshots are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Snapshot files are named `<file_prefix>_<profile id>_raw.json`
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file_prefix: "profile".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Field-set TOML; the built-in guest profile when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<PathBuf>,
    pub expansion: ExpansionConfig,
    pub output: OutputConfig,
}

impl ScraperConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.expansion.validate()?;
        if self.output.file_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "output.file_prefix must not be empty".to_string(),
            ));
        }
        if self.output.file_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(
                "output.file_prefix must not contain path separators".to_string(),
            ));
        }
        Ok(())
    }

    /// Field set named by `fields`, or the built-in guest profile
    pub fn load_fields(&self) -> Result<FieldSet, Error> {
        match &self.fields {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|source| Error::FieldsRead {
                    path: path.clone(),
                    source,
                })?;
                Ok(FieldSet::from_toml(&contents)?)
            }
            None => Ok(profile::guest_profile()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = ScraperConfig::from_toml("").unwrap();
        assert_eq!(config, ScraperConfig::default());
        assert_eq!(config.expansion.max_iterations, 10);
        assert_eq!(config.output.file_prefix, "profile");
    }

    #[test]
    fn test_partial_sections() {
        let config = ScraperConfig::from_toml(
            r#"
            [expansion]
            max_iterations = 3
            deadline_ms = 30000

            [output]
            dir = "/tmp/profiles"
            "#,
        )
        .unwrap();

        assert_eq!(config.expansion.max_iterations, 3);
        assert_eq!(config.expansion.settle_delay_ms, 1000);
        assert_eq!(config.expansion.deadline_ms, Some(30000));
        assert_eq!(config.output.dir, PathBuf::from("/tmp/profiles"));
        assert_eq!(config.output.file_prefix, "profile");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ScraperConfig::from_toml("[expansion]\nmax_iterations = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ScraperConfig::from_toml("[output]\nfile_prefix = \"a/b\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ScraperConfig::from_toml("[expansion"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ScraperConfig::default();
        config.expansion.deadline_ms = Some(5000);
        let parsed = ScraperConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_fields() {
        let builtin = ScraperConfig::default().load_fields().unwrap();
        assert_eq!(builtin.len(), 8);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.toml");
        fs::write(
            &path,
            "[[fields]]\nname = \"title\"\nselectors = [\"h1\"]\nrequired = true\n",
        )
        .unwrap();
        let config = ScraperConfig {
            fields: Some(path),
            ..ScraperConfig::default()
        };
        let fields = config.load_fields().unwrap();
        assert_eq!(fields.names().collect::<Vec<_>>(), vec!["title"]);

        let missing = ScraperConfig {
            fields: Some(dir.path().join("nope.toml")),
            ..ScraperConfig::default()
        };
        assert!(matches!(
            missing.load_fields(),
            Err(Error::FieldsRead { .. })
        ));
    }
}
