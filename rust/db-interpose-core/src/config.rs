//! Shim configuration.
//!
//! An optional TOML file named by `DB_INTERPOSE_CONFIG`, with environment
//! overrides for the settings operators actually flip at deploy time.
//! Loading never fails the shim: a broken file is reported once and the
//! defaults take over.

use std::env;
use std::fs;
use std::path::Path;

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShimConfig {
    /// Log destination: a path, or the literals `stdout` / `stderr`.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// `debug`, `info`, or `error`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Kill switch: load the library but initialize nothing.
    #[serde(default)]
    pub disabled: bool,
}

fn default_log_file() -> String {
    "/tmp/db_interpose.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ShimConfig {
    fn default() -> Self {
        ShimConfig {
            log_file: default_log_file(),
            log_level: default_log_level(),
            disabled: false,
        }
    }
}

impl ShimConfig {
    pub fn from_file(path: &Path) -> Result<ShimConfig, ConfigError> {
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }

    /// File (if named) then environment overrides.
    pub fn load() -> ShimConfig {
        let mut cfg = match env::var("DB_INTERPOSE_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path)).unwrap_or_else(|err| {
                eprintln!("db_interpose: ignoring config file {path}: {err}");
                ShimConfig::default()
            }),
            Err(_) => ShimConfig::default(),
        };
        if let Ok(v) = env::var("DB_INTERPOSE_LOG_FILE") {
            cfg.log_file = v;
        }
        if let Ok(v) = env::var("DB_INTERPOSE_LOG_LEVEL") {
            cfg.log_level = v;
        }
        if env::var_os("DB_INTERPOSE_DISABLE").is_some() {
            cfg.disabled = true;
        }
        cfg
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self.log_level.to_ascii_lowercase().as_str() {
            "debug" => LevelFilter::Debug,
            "error" => LevelFilter::Error,
            _ => LevelFilter::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = ShimConfig::default();
        assert_eq!(cfg.log_file, "/tmp/db_interpose.log");
        assert_eq!(cfg.level_filter(), LevelFilter::Info);
        assert!(!cfg.disabled);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shim.toml");
        let mut f = fs::File::create(&path).expect("create config");
        writeln!(f, "log_file = \"stderr\"\nlog_level = \"debug\"").expect("write config");

        let cfg = ShimConfig::from_file(&path).expect("parse config");
        assert_eq!(cfg.log_file, "stderr");
        assert_eq!(cfg.level_filter(), LevelFilter::Debug);
        // Unspecified fields keep their defaults.
        assert!(!cfg.disabled);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shim.toml");
        fs::write(&path, "log_file = [not toml").expect("write config");
        assert!(ShimConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let cfg = ShimConfig {
            log_level: "chatty".to_string(),
            ..ShimConfig::default()
        };
        assert_eq!(cfg.level_filter(), LevelFilter::Info);
    }
}
