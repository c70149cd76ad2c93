//! Decoder limits.
//!
//! The byte format itself places no bound on nesting, so the decoder enforces the
//! limits below to stay safe against adversarial input. With the `serde` feature the
//! configuration can be loaded from a TOML file.
#[cfg(feature = "serde")]
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of the environment variable holding the path to the codec configuration file.
/// If not set, [`CodecConfig::default_path`] falls back to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/ergotree/codec.toml` or `$HOME/.config/ergotree/codec.toml`
///  (2) on Windows: `%APPDATA%\ergotree\codec.toml`
pub const ENV_CONFIG_PATH: &str = "ERGOTREE_CONFIG_PATH";

/// Default bound on type descriptor nesting.
pub const DEFAULT_MAX_TYPE_DEPTH: usize = 100;

/// Default bound on expression nesting.
pub const DEFAULT_MAX_EXPR_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    /// Deepest type descriptor accepted (a primitive has depth 1).
    pub max_type_depth: usize,
    /// Deepest expression accepted (a leaf has depth 1).
    pub max_expr_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_type_depth: DEFAULT_MAX_TYPE_DEPTH,
            max_expr_depth: DEFAULT_MAX_EXPR_DEPTH,
        }
    }
}

/// Errors raised while loading a [`CodecConfig`] from disk.
#[cfg(feature = "serde")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ParseError {
        source: toml::de::Error,
        file: String,
    },
}

#[cfg(feature = "serde")]
impl CodecConfig {
    /// Get the default path to the configuration file.
    pub fn default_path() -> PathBuf {
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push("ergotree");
        path.push("codec.toml");
        path
    }

    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, "<string>")
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> Result<Self, ConfigError> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::parse(&toml_str, &path.display().to_string())
    }

    fn parse(text: &str, file: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseError {
            source: e,
            file: file.to_string(),
        })
    }
}
