//! Error handling for the layergen plugin pipeline.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Plugins return these errors from
//! their callbacks; the registry wraps them in [`Error::Plugin`] so the caller
//! always learns which plugin aborted the run.
//!
//! # Examples
//!
//! ```
//! use layergen::core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::design("service has no name"))
//! }
//!
//! assert!(might_fail().is_err());
//! ```

use std::fmt;

use thiserror::Error;

/// Result type for layergen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage a plugin error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    Generate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Prepare => write!(f, "prepare"),
            Stage::Generate => write!(f, "generate"),
        }
    }
}

/// Main error type for layergen operations
#[derive(Debug, Error)]
pub enum Error {
    /// A plugin callback failed and aborted the run
    #[error("plugin '{plugin}' failed during {stage}: {source}")]
    Plugin {
        plugin: String,
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    /// Strict mode: a file expected by a plugin is absent
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Strict mode: no section with the expected name in a file
    #[error("Section '{name}' not found in {path}")]
    SectionNotFound { path: String, name: String },

    /// Strict mode: a patch pattern matched nothing
    #[error("Pattern `{pattern}` did not match section '{section}'")]
    PatternNotMatched { pattern: String, section: String },

    /// Two files with the same path in one file set
    #[error("Duplicate file path: {0}")]
    DuplicateFile(String),

    /// A generate callback returned a file set without a file it received
    #[error("plugin '{plugin}' dropped file {path}")]
    DroppedFile { plugin: String, path: String },

    /// Patch pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Section template failed to render
    #[error("Render error in {path} (section '{section}'): {message}")]
    Render {
        path: String,
        section: String,
        message: String,
    },

    /// Design description error
    #[error("Design error: {0}")]
    Design(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing an artifact failed
    #[error("Failed to write {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new design error
    pub fn design<S: Into<String>>(msg: S) -> Self {
        Self::Design(msg.into())
    }

    /// Create an output error for `path`
    pub fn output(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Wrap an error raised by a plugin callback
    pub fn plugin<S: Into<String>>(plugin: S, stage: Stage, source: Error) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            stage,
            source: Box::new(source),
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Config(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Config(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_config_creation() {
        let error = Error::config("Invalid configuration");
        assert!(matches!(error, Error::Config(_)));
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid configuration"
        );
    }

    #[test]
    fn test_plugin_error_keeps_originating_message() {
        let error = Error::plugin("readme", Stage::Generate, Error::design("no API name"));
        assert_eq!(
            error.to_string(),
            "plugin 'readme' failed during generate: Design error: no API name"
        );
        let source = std::error::Error::source(&error).unwrap();
        assert_eq!(source.to_string(), "Design error: no API name");
    }

    #[test]
    fn test_error_from_str() {
        let error: Error = "Test error message".into();
        assert!(matches!(error, Error::Config(_)));
        assert_eq!(error.to_string(), "Configuration error: Test error message");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
        assert!(error.to_string().contains("File not found"));
    }

    #[test]
    fn test_error_from_regex_error() {
        let regex_error = regex::Regex::new("(unclosed").unwrap_err();
        let error: Error = regex_error.into();
        assert!(matches!(error, Error::InvalidPattern(_)));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Prepare.to_string(), "prepare");
        assert_eq!(Stage::Generate.to_string(), "generate");
    }
}
