//! TOML configuration file helpers

use crate::error::{ErrorContext, IReportError, IReportResult};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// Read and parse a TOML file into `T`
pub fn load_toml<T, P>(path: P) -> IReportResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| IReportError::Config {
        message: format!("Failed to read config file {}: {}", path.display(), e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("config")
            .with_operation("read_file")
            .with_suggestion("Check if the config file exists and is readable"),
    })?;

    toml::from_str(&content).map_err(|e| IReportError::Config {
        message: format!("Failed to parse config: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("config")
            .with_operation("parse_toml")
            .with_suggestion("Check TOML syntax in config file"),
    })
}

/// Serialize `value` as pretty TOML and write it, creating parent directories
pub fn save_toml<T, P>(value: &T, path: P) -> IReportResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = toml::to_string_pretty(value).map_err(|e| IReportError::Config {
        message: format!("Failed to serialize config: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("config").with_operation("serialize_toml"),
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content).map_err(|e| IReportError::Config {
        message: format!("Failed to write config file: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("config")
            .with_operation("write_file")
            .with_suggestion("Check if the directory exists and is writable"),
    })
}
