use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use boilerstrip_audit::DateRange;

#[derive(Parser)]
#[command(name = "boilerstrip")]
#[command(about = "Blank boilerplate PDF pages that match a reference", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: <config dir>/boilerstrip/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage matching rules
    #[command(subcommand)]
    Rules(RuleCommands),

    /// Process the source folder once
    Run(RunArgs),

    /// Show audit log entries for a date range
    Log(LogArgs),

    /// Show or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// List rules in precedence order
    List,

    /// Add a rule at the end of the list
    Add {
        /// Substring the file name must contain (case-sensitive)
        #[arg(long)]
        pattern: String,

        /// Pages to compare and blank, e.g. "1,3"
        #[arg(long)]
        pages: String,

        /// Reference document; copied into the reference folder
        #[arg(long)]
        reference: PathBuf,
    },

    /// Remove the rule at a position shown by `rules list`
    Remove {
        /// 1-based position
        position: usize,
    },
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(long)]
    pub source: Option<PathBuf>,

    #[arg(long)]
    pub destination: Option<PathBuf>,

    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Largest normalized pixel difference still counted as equal (0 to 1)
    #[arg(long)]
    pub tolerance: Option<f32>,

    /// Render resolution used for comparison
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Print per-file outcomes as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct LogArgs {
    /// First day, YYYY-MM-DD (default: --to, or today)
    #[arg(long, conflicts_with_all = ["today", "this_month"])]
    pub from: Option<NaiveDate>,

    /// Last day, YYYY-MM-DD (default: today)
    #[arg(long, conflicts_with_all = ["today", "this_month"])]
    pub to: Option<NaiveDate>,

    #[arg(long, conflicts_with = "this_month")]
    pub today: bool,

    #[arg(long)]
    pub this_month: bool,
}

impl LogArgs {
    pub fn range(&self, today: NaiveDate) -> DateRange {
        if self.this_month {
            return DateRange::month(today);
        }
        if self.today {
            return DateRange::day(today);
        }
        let to = self.to.unwrap_or(today);
        let from = self.from.unwrap_or(to);
        DateRange::days(from, to)
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write the default configuration unless one exists
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
