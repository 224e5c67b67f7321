//! Runtime configuration.
//!
//! ```toml
//! defer-initial-draw = true
//! clear-target = true
//! trace-snapshots = false
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

/// Options of a [`Dom`](crate::Dom) runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Attach the first render on the next animation frame instead of immediately.
    pub defer_initial_draw: bool,
    /// Empty the target before attaching the rendered root.
    pub clear_target: bool,
    /// Log a JSON snapshot of the virtual tree after every pass, at `trace` level.
    pub trace_snapshots: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defer_initial_draw: true,
            clear_target: true,
            trace_snapshots: false,
        }
    }
}

/// Failure to load a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The contents are not valid TOML for a [`Config`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// Parses a TOML document. Missing keys take their default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Controls whether the first render waits for an animation frame.
    #[must_use]
    pub const fn defer_initial_draw(mut self, defer: bool) -> Self {
        self.defer_initial_draw = defer;
        self
    }

    /// Controls whether the target is emptied before attaching.
    #[must_use]
    pub const fn clear_target(mut self, clear: bool) -> Self {
        self.clear_target = clear;
        self
    }

    /// Controls snapshot logging after every pass.
    #[must_use]
    pub const fn trace_snapshots(mut self, trace: bool) -> Self {
        self.trace_snapshots = trace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = Config::from_toml_str("trace-snapshots = true").unwrap();
        assert_eq!(config, Config::default().trace_snapshots(true));
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn invalid_documents_are_rejected() {
        let error = Config::from_toml_str("defer-initial-draw = \"soon\"").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
        assert!(error.to_string().starts_with("failed to parse config"));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = Config::load("/nonexistent/tidal.toml").unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
        assert!(error.to_string().contains("/nonexistent/tidal.toml"));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default().defer_initial_draw(false).clear_target(false);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}
