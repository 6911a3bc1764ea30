mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };

    match cli.command {
        cli::Commands::Rules(cmd) => commands::rules::handle(cmd, &config_path),
        cli::Commands::Run(args) => commands::run::handle(args, &config_path),
        cli::Commands::Log(args) => commands::log::handle(args, &config_path),
        cli::Commands::Config(cmd) => commands::config::handle(cmd, &config_path),
    }
}
