//! cwlforge Configuration Module
//!
//! Manages persistent defaults and platform settings.
//! Config is stored in `~/.config/cwlforge/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`CWLFORGE_ENDPOINT`, `CWLFORGE_PROJECT`,
//!    `CWLFORGE_PROFILE`, `CWLFORGE_LOG`)
//! 2. Config file (`~/.config/cwlforge/config.toml`)
//! 3. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CwlError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CwlForgeConfig {
    /// Document and logging defaults
    #[serde(default)]
    pub defaults: Defaults,

    /// Remote platform settings
    #[serde(default)]
    pub platform: PlatformConfig,
}

/// Default settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Defaults {
    /// cwlVersion `validate` expects documents to declare (v1.0)
    pub cwl_version: Option<String>,

    /// Output format for `convert` (yaml, json)
    pub format: Option<String>,

    /// Log filter used when RUST_LOG is unset (e.g. "cwlforge=info")
    pub log: Option<String>,
}

/// Platform settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlatformConfig {
    /// Credentials profile (default, cgc, cavatica)
    pub profile: Option<String>,

    /// API endpoint
    pub endpoint: Option<String>,

    /// Project used when none is given explicitly
    pub project: Option<String>,
}

impl CwlForgeConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/cwlforge/` on Unix, `%APPDATA%/cwlforge/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cwlforge")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default path
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`
    ///
    /// Returns error if the file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| CwlError::Config {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| CwlError::Config {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| CwlError::Config {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| CwlError::Config {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| CwlError::Config {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    /// Empty variables are ignored.
    pub fn with_env(mut self) -> Self {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        if let Some(endpoint) = env("CWLFORGE_ENDPOINT") {
            self.platform.endpoint = Some(endpoint);
        }
        if let Some(project) = env("CWLFORGE_PROJECT") {
            self.platform.project = Some(project);
        }
        if let Some(profile) = env("CWLFORGE_PROFILE") {
            self.platform.profile = Some(profile);
        }
        if let Some(log) = env("CWLFORGE_LOG") {
            self.defaults.log = Some(log);
        }

        self
    }

    /// cwlVersion for new documents
    pub fn cwl_version(&self) -> &str {
        self.defaults.cwl_version.as_deref().unwrap_or(crate::process::CWL_VERSION)
    }

    /// Log filter directive, `cwlforge=warn` unless configured
    pub fn log_filter(&self) -> &str {
        self.defaults.log.as_deref().unwrap_or("cwlforge=warn")
    }

    /// Platform profile, `default` unless configured
    pub fn profile(&self) -> &str {
        self.platform.profile.as_deref().unwrap_or("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path_contains_cwlforge() {
        let path = CwlForgeConfig::config_path();
        assert!(path.to_string_lossy().contains("cwlforge"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_default_config_values() {
        let config = CwlForgeConfig::default();
        assert_eq!(config.cwl_version(), "v1.0");
        assert_eq!(config.log_filter(), "cwlforge=warn");
        assert_eq!(config.profile(), "default");
        assert!(config.platform.project.is_none());
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = CwlForgeConfig {
            defaults: Defaults {
                cwl_version: Some("v1.0".into()),
                format: Some("json".into()),
                log: None,
            },
            platform: PlatformConfig {
                profile: Some("cgc".into()),
                endpoint: Some("https://cgc-api.sbgenomics.com/v2".into()),
                project: Some("lab/rnaseq".into()),
            },
        };

        config.save_to(&config_path).unwrap();
        let loaded = CwlForgeConfig::load_from(&config_path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = CwlForgeConfig::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CwlForgeConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[platform\nproject = 1").unwrap();
        let err = CwlForgeConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, CwlError::Config { .. }));
    }

    #[test]
    fn test_env_overrides_config() {
        env::set_var("CWLFORGE_PROJECT", "lab/from-env");
        env::set_var("CWLFORGE_ENDPOINT", "");

        let config = CwlForgeConfig {
            platform: PlatformConfig {
                endpoint: Some("https://api.example".into()),
                project: Some("lab/from-config".into()),
                ..Default::default()
            },
            ..Default::default()
        }
        .with_env();

        assert_eq!(config.platform.project.as_deref(), Some("lab/from-env"));
        assert_eq!(config.platform.endpoint.as_deref(), Some("https://api.example"));

        env::remove_var("CWLFORGE_PROJECT");
        env::remove_var("CWLFORGE_ENDPOINT");
    }

    #[test]
    fn test_toml_format() {
        let config = CwlForgeConfig {
            platform: PlatformConfig {
                project: Some("lab/rnaseq".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[defaults]"));
        assert!(toml_str.contains("[platform]"));
        assert!(toml_str.contains("project = \"lab/rnaseq\""));
    }
}
