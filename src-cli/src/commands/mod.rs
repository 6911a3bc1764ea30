pub mod config;
pub mod log;
pub mod rules;
pub mod run;

use anyhow::{Context, Result};
use std::path::Path;

use boilerstrip_audit::AuditLog;

use crate::config::{load_config, AppConfig};

/// Loads the configuration and opens the audit log it names.
pub(crate) fn open(config_path: &Path) -> Result<(AppConfig, AuditLog)> {
    let config = load_config(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    tracing::debug!(config = %config_path.display(), "configuration loaded");
    let audit = AuditLog::open(&config.log_file)?;
    Ok((config, audit))
}
