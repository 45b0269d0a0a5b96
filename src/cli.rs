use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE, value_name = "PATH")]
    pub config: PathBuf,

    /// Log filter (e.g. `debug`, `compactgen=trace`); overrides RUST_LOG
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the interface extracted from a contract source
    Analyze {
        /// Contract source file
        source: PathBuf,
        /// Emit JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Generate the API wrapper and CLI sources
    Generate {
        /// Contract source file
        source: PathBuf,
        /// Project root; files land in `<out>/src/`
        out: PathBuf,
    },
    /// Run the full compile / build / generate pipeline once
    Build {
        /// Contract source, overrides `build.source`
        #[arg(long, value_name = "PATH")]
        source: Option<PathBuf>,
    },
    /// Rebuild whenever a contract source changes
    Watch {
        /// Contract source, overrides `build.source`
        #[arg(long, value_name = "PATH")]
        source: Option<PathBuf>,
    },
    /// Interactive menu against an in-memory dry-run contract
    Menu {
        /// Contract source file
        source: PathBuf,
    },
}
