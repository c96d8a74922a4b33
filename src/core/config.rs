//! Pipeline configuration
//!
//! Loaded from a TOML or YAML file; command line flags override individual
//! values afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codegen::Strictness;
use crate::core::error::{Error, Result};
use crate::plugins;

/// Settings for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Import path of the generated package root, e.g. `calc/gen`
    pub genpkg: String,
    /// Hooks to run, in order
    pub hooks: Vec<String>,
    /// Enabled built-in plugins; all of them when unset
    pub plugins: Option<Vec<String>>,
    /// Turn lookup misses and unmatched patches into errors
    pub strict: bool,
    pub output_dir: PathBuf,
    /// Vendor written into the Dockerfile and Makefile
    pub company: Option<String>,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            genpkg: String::new(),
            hooks: vec!["gen".to_string(), "example".to_string()],
            plugins: None,
            strict: false,
            output_dir: PathBuf::from("."),
            company: None,
            cors: CorsConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading pipeline configuration");
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => {
                return Err(Error::config(format!(
                    "unsupported configuration format: {}",
                    path.display()
                )));
            }
        };
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn strictness(&self) -> Strictness {
        Strictness::from_flag(self.strict)
    }

    /// Whether the built-in plugin `name` should be registered
    pub fn is_enabled(&self, name: &str) -> bool {
        match &self.plugins {
            Some(enabled) => enabled.iter().any(|p| p == name),
            None => true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.genpkg.trim().is_empty() {
            return Err(Error::config("genpkg cannot be empty"));
        }
        if self.hooks.is_empty() {
            return Err(Error::config("at least one hook must be configured"));
        }
        if let Some(enabled) = &self.plugins {
            let known = plugins::builtin_names();
            if let Some(unknown) = enabled.iter().find(|p| !known.contains(&p.as_str())) {
                return Err(Error::config(format!(
                    "unknown plugin '{unknown}', expected one of: {}",
                    known.join(", ")
                )));
            }
        }
        if self.cors.allowed_origins.is_empty() {
            return Err(Error::config("cors.allowed_origins cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.hooks, vec!["gen", "example"]);
        assert_eq!(config.cors.allowed_origins, vec!["*"]);
        assert!(config.is_enabled("readme"));
        assert_eq!(config.strictness(), Strictness::Lenient);
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layergen.toml");
        std::fs::write(
            &path,
            "genpkg = \"calc/gen\"\nstrict = true\nplugins = [\"readme\", \"cors\"]\n\n[cors]\nallowed_origins = [\"https://example.com\"]\n",
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.genpkg, "calc/gen");
        assert!(config.strict);
        assert!(config.is_enabled("cors"));
        assert!(!config.is_enabled("dockerfile"));
        assert_eq!(config.cors.allowed_origins, vec!["https://example.com"]);
        assert_eq!(config.cors.allowed_methods.len(), 5);
        assert_eq!(config.hooks, vec!["gen", "example"]);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layergen.yml");
        std::fs::write(&path, "genpkg: calc/gen\nhooks: [example]\ncompany: acme\n").unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.hooks, vec!["example"]);
        assert_eq!(config.company.as_deref(), Some("acme"));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layergen.ini");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(PipelineConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate() {
        let mut config = PipelineConfig::default();
        assert!(config.validate().is_err());

        config.genpkg = "calc/gen".to_string();
        assert!(config.validate().is_ok());

        config.plugins = Some(vec!["swagger".to_string()]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown plugin 'swagger'"));

        config.plugins = None;
        config.hooks.clear();
        assert!(config.validate().is_err());
    }
}
