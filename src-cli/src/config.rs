use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use boilerstrip_verify::CompareOptions;

const APP_DIR: &str = "boilerstrip";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    // ============ Folders ============
    /// Documents waiting to be checked
    pub source_folder: PathBuf,
    /// Where converted documents are written
    pub destination_folder: PathBuf,
    /// Copies of the reference documents named by rules
    pub reference_folder: PathBuf,

    // ============ Stores ============
    pub rules_file: PathBuf,
    pub log_file: PathBuf,

    // ============ Comparison ============
    pub tolerance: f32,
    pub dpi: u32,

    // ============ Rendering ============
    /// Explicit pdfium library; searched for when unset
    pub pdfium_library: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config dir unavailable")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tolerance must be between 0 and 1, got {0}")]
    Tolerance(f32),
    #[error("dpi must be positive")]
    Dpi,
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn work_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for AppConfig {
    fn default() -> Self {
        let defaults = CompareOptions::default();
        Self {
            source_folder: work_dir().join("Source"),
            destination_folder: work_dir().join("Modified"),
            reference_folder: app_dir().join("Reference"),
            rules_file: app_dir().join("boilerstrip.rules"),
            log_file: app_dir().join("boilerstrip.log"),
            tolerance: defaults.tolerance,
            dpi: defaults.dpi,
            pdfium_library: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.tolerance) {
            return Err(ConfigError::Tolerance(self.tolerance));
        }
        if self.dpi == 0 {
            return Err(ConfigError::Dpi);
        }
        Ok(())
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            tolerance: self.tolerance,
            dpi: self.dpi,
        }
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join(APP_DIR).join("config.json"))
}

/// Reads the configuration; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    fs::write(path, raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.tolerance, 0.01);
        assert_eq!(config.dpi, 150);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "sourceFolder": "/data/in", "dpi": 96 }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.source_folder, PathBuf::from("/data/in"));
        assert_eq!(config.dpi, 96);
        assert_eq!(config.tolerance, 0.01);
        assert_eq!(config.log_file, AppConfig::default().log_file);
    }

    #[test]
    fn test_save_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        save_config(&path, &AppConfig::default()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"destinationFolder\""));
        assert!(raw.contains("\"rulesFile\""));
        assert_eq!(load_config(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_out_of_range_tolerance_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "tolerance": 1.5 }"#).unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Tolerance(_))));
    }
}
