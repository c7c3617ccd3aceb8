//! Frontend settings from `config.toml`.

use std::path::{Path, PathBuf};

use cadence_core::prelude::Compressor;
use serde::Deserialize;

const APP_DIR: &str = "cadence";
const CONFIG_FILE: &str = "config.toml";

/// Every key is optional; command-line flags take precedence.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub controller: Option<String>,
    pub load_address: Option<u16>,
    pub clock_resolution: Option<i64>,
    pub isr_freq: Option<f64>,
    pub exit_address: Option<u16>,
    pub compressor: Option<Compressor>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {}

/// `<config dir>/cadence/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl Config {
    /// Load `explicit`, which must exist, or else the default file when
    /// present. No file at all yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_keys() {
        let config: Config = toml::from_str(
            r#"
            controller = "test"
            load-address = 0
            clock-resolution = 1000000
            isr-freq = 0.5
            exit-address = 0x0000
            compressor = "none"
            "#,
        )
        .unwrap();
        assert_eq!(config.controller.as_deref(), Some("test"));
        assert_eq!(config.load_address, Some(0));
        assert_eq!(config.clock_resolution, Some(1_000_000));
        assert_eq!(config.isr_freq, Some(0.5));
        assert_eq!(config.exit_address, Some(0));
        assert_eq!(config.compressor, Some(Compressor::Stored));
    }

    #[test]
    fn empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "scale = 3\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(Some(&dir.path().join("absent.toml"))),
            Err(ConfigError::Io { .. })
        ));
    }
}
