//! JSON configuration file for the journal pipeline.
//!
//! Every section and key is optional; anything missing falls back to its
//! default. Unknown keys are rejected so typos surface instead of silently
//! reverting to defaults.
//!
//! ```json
//! {
//!   "paths": { "database": "sources/journal_entries.db" },
//!   "processing": { "max_description_length": 120 },
//!   "output": { "pretty_print": false }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::options::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_DESCRIPTION_LENGTH, ProcessingOptions};

/// File looked up in the working directory when no configuration path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalConfig {
    pub paths: PathsSection,
    pub processing: ProcessingSection,
    pub logging: LoggingSection,
    pub output: OutputSection,
}

/// Locations of the source database, XML schema and output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub database: PathBuf,
    pub schema: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            database: PathBuf::from("sources/journal_entries.db"),
            schema: PathBuf::from("sources/schema.xsd"),
            output: PathBuf::from("sources/output.xml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingSection {
    pub batch_size: usize,
    /// Disables schema validation regardless of `output.validate_xml`.
    pub skip_validation: bool,
    pub max_description_length: usize,
}

impl Default for ProcessingSection {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            skip_validation: false,
            max_description_length: DEFAULT_MAX_DESCRIPTION_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// One of `error`, `warn`, `info`, `debug`, `trace`, `off` (any case).
    pub level: String,
    /// `pretty`, `compact` or `json`. Anything else is kept as written and
    /// falls back to `pretty`; see [`LoggingSection::style`].
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogStyle::default().as_str().to_string(),
        }
    }
}

impl LoggingSection {
    /// Parsed log level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown level name.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.level.trim()).map_err(|_| ConfigError::InvalidValue {
            key: "logging.level",
            message: format!("unknown level {:?}", self.level),
        })
    }

    /// Parsed log style, `None` when `format` names no known style.
    ///
    /// Older configuration files carry a `logging` format template here;
    /// callers warn and use the default style instead of rejecting the file.
    pub fn style(&self) -> Option<LogStyle> {
        LogStyle::from_name(&self.format)
    }
}

/// Log output style selectable from the configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogStyle {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogStyle {
    /// Case-insensitive style name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub pretty_print: bool,
    pub validate_xml: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            pretty_print: true,
            validate_xml: true,
        }
    }
}

/// Where the active configuration came from.
#[derive(Debug)]
pub enum ConfigSource {
    /// The file given on the command line.
    Explicit(PathBuf),
    /// [`DEFAULT_CONFIG_FILE`] in the working directory.
    DefaultFile(PathBuf),
    /// No configuration file; built-in defaults.
    Defaults,
    /// The default file exists but failed to load; built-in defaults.
    Ignored { path: PathBuf, error: ConfigError },
}

impl ConfigSource {
    /// The file the values were read from, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::DefaultFile(path) => Some(path),
            Self::Defaults | Self::Ignored { .. } => None,
        }
    }

    /// Directory relative configured paths are resolved against.
    ///
    /// The configuration file's directory, or `None` when defaults are used
    /// and paths are relative to the working directory.
    pub fn base_dir(&self) -> Option<&Path> {
        self.path()
            .map(|path| path.parent().unwrap_or_else(|| Path::new("")))
    }
}

/// Configured paths after resolving relative entries against a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub database: PathBuf,
    pub schema: PathBuf,
    pub output: PathBuf,
}

impl JournalConfig {
    /// Parse configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, unknown keys, or invalid values.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file that must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load the explicit file, or fall back to [`DEFAULT_CONFIG_FILE`] / defaults.
    ///
    /// An explicit path must load cleanly. The implicit default file is
    /// optional: when absent or invalid, defaults are used and the returned
    /// [`ConfigSource`] says why, so the caller can report it once logging
    /// is set up.
    ///
    /// # Errors
    ///
    /// Returns an error only when `explicit` is given and cannot be loaded.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load(path)?;
            return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if !default_path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults));
        }
        match Self::load(&default_path) {
            Ok(config) => Ok((config, ConfigSource::DefaultFile(default_path))),
            Err(error) => Ok((
                Self::default(),
                ConfigSource::Ignored {
                    path: default_path,
                    error,
                },
            )),
        }
    }

    /// Write this configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Check values that parse but are not usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.level_filter()?;
        if self.processing.max_description_length == 0 {
            return Err(ConfigError::InvalidValue {
                key: "processing.max_description_length",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Options for the transform stage.
    pub fn processing_options(&self) -> ProcessingOptions {
        ProcessingOptions::new()
            .with_max_description_length(self.processing.max_description_length)
            .with_batch_size(self.processing.batch_size)
    }

    /// Whether the output document should be checked against the schema.
    pub fn schema_validation_enabled(&self) -> bool {
        self.output.validate_xml && !self.processing.skip_validation
    }

    /// Resolve relative paths against `base_dir`; absolute paths are kept.
    pub fn resolve_paths(&self, base_dir: &Path) -> ResolvedPaths {
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        };
        ResolvedPaths {
            database: resolve(&self.paths.database),
            schema: resolve(&self.paths.schema),
            output: resolve(&self.paths.output),
        }
    }
}
