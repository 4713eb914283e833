//! Settings loaded from TOML.
//!
//! ```toml
//! [mapper]
//! match_threshold = 0.35
//!
//! [verifier]
//! close_tolerance = 0.02
//! target_period_end = "2024-09-28"
//!
//! [synonyms]
//! path = "synonyms.toml"
//! ```
//!
//! Every key is optional; missing keys keep their defaults. Files are looked up
//! in order: an explicit path, `./.ledgerlens.toml`, then
//! `<config_dir>/ledgerlens/config.toml`. The first file found is used.

use ledgerlens_mapping::{MapperConfig, MappingError, SynonymTable};
use ledgerlens_verify::{VerifierConfig, VerifyError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".ledgerlens.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid TOML for [`Settings`]
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// Mapper settings or synonym table rejected
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Verifier settings rejected
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Where the synonym table comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymSettings {
    /// Custom synonym table; the embedded table is used when absent
    pub path: Option<PathBuf>,
}

/// All settings of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Concept mapper settings
    pub mapper: MapperConfig,
    /// Cross-verifier settings
    pub verifier: VerifierConfig,
    /// Synonym table location
    pub synonyms: SynonymSettings,
}

/// Platform config file: `<config_dir>/ledgerlens/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ledgerlens").join("config.toml"))
}

impl Settings {
    /// Parses settings from TOML text. `origin` is only used in errors.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut settings: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        // A relative synonym path is relative to the config file.
        if let Some(path) = settings.synonyms.path.as_mut()
            && path.is_relative()
            && let Some(dir) = origin.parent()
        {
            *path = dir.join(&*path);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Loads settings through the lookup cascade.
    ///
    /// An explicit path must exist. The local and platform files are optional,
    /// but one that exists and fails to parse is an error. Returns the
    /// settings and the file they came from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_path(path)?, Some(path.to_path_buf())));
        }

        let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)).chain(config_path());
        for path in candidates {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading config");
                return Ok((Self::from_path(&path)?, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Checks mapper and verifier settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mapper.validate()?;
        self.verifier.validate()?;
        Ok(())
    }

    /// The synonym table these settings select.
    pub fn synonym_table(&self) -> Result<SynonymTable, ConfigError> {
        match &self.synonyms.path {
            Some(path) => Ok(SynonymTable::from_path(path)?),
            None => Ok(SynonymTable::builtin().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = Settings::from_toml_str("", Path::new("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let text = r#"
            [mapper]
            match_threshold = 0.35

            [verifier]
            target_period_end = "2024-09-28"
        "#;
        let settings = Settings::from_toml_str(text, Path::new("config.toml")).unwrap();

        assert_relative_eq!(settings.mapper.match_threshold, 0.35);
        assert_relative_eq!(settings.mapper.direct_weight, 0.4);
        assert_relative_eq!(settings.verifier.close_tolerance, 0.05);
        assert_eq!(
            settings.verifier.target_period_end,
            NaiveDate::from_ymd_opt(2024, 9, 28)
        );
        assert!(settings.synonyms.path.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let text = "[mapper]\nmatch_threshold = 0.95\nhigh_threshold = 0.9\n";
        let err = Settings::from_toml_str(text, Path::new("config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Mapping(MappingError::InvalidConfig(_))));

        let text = "[verifier]\nexact_tolerance = 0.1\nclose_tolerance = 0.05\n";
        let err = Settings::from_toml_str(text, Path::new("config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Verify(_)));
    }

    #[test]
    fn test_malformed_toml_names_file() {
        let err = Settings::from_toml_str("[mapper\n", Path::new("/etc/ll.toml")).unwrap_err();
        assert!(err.to_string().contains("/etc/ll.toml"));
    }

    #[test]
    fn test_relative_synonym_path_resolved_against_config_dir() {
        let text = "[synonyms]\npath = \"tables/synonyms.toml\"\n";
        let settings = Settings::from_toml_str(text, Path::new("/srv/ll/config.toml")).unwrap();
        assert_eq!(
            settings.synonyms.path.as_deref(),
            Some(Path::new("/srv/ll/tables/synonyms.toml"))
        );
    }

    #[test]
    fn test_explicit_path_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[verifier]\nrule_tolerance = 0.02").unwrap();

        let (settings, origin) = Settings::load(Some(&path)).unwrap();
        assert_relative_eq!(settings.verifier.rule_tolerance, 0.02);
        assert_eq!(origin.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/ledgerlens.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_default_synonym_table() {
        let table = Settings::default().synonym_table().unwrap();
        assert_eq!(table.version(), SynonymTable::builtin().version());
    }
}
