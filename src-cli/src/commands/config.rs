use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::ConfigCommands;
use crate::config::{load_config, save_config, AppConfig};

pub fn handle(cmd: ConfigCommands, config_path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config_path),
        ConfigCommands::Init { force } => init(config_path, force),
    }
}

fn show(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let source = if config_path.exists() {
        "file"
    } else {
        "defaults"
    };
    println!("# {} ({})", config_path.display(), source);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    save_config(config_path, &AppConfig::default())?;
    println!("✓ Wrote {}", config_path.display());
    Ok(())
}
