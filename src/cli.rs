use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paneldash")]
#[command(about = "Terminal dashboard of independently refreshing panels", long_about = None)]
pub struct Cli {
    /// Config file to load and watch (defaults to the per-user config)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log file (defaults to paneldash.log next to the config file)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the config file and list every problem found
    CheckConfig {
        /// Print problems as JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Write the default config if none exists, and show its location
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
