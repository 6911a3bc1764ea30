use anyhow::Result;
use chrono::Local;
use std::path::Path;

use boilerstrip_audit::query_file;

use crate::cli::LogArgs;
use crate::config::load_config;

pub fn handle(args: LogArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let range = args.range(Local::now().date_naive());
    let result = query_file(&config.log_file, &range)?;

    print!("{}", result.text);
    println!(
        "{} to {}: {} files converted",
        range.start, range.end, result.converted_files
    );
    Ok(())
}
