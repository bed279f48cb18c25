use clap::{Parser, Subcommand};
use anyhow::Result;
use std::path::PathBuf;
use log::debug;

use crate::calendar::MAX_WINDOW_DAYS;

/// Daily word-count statistics for cloud documents
#[derive(Parser, Debug)]
#[command(name = "docstats")]
#[command(about = "Track how many words you add and remove each day across your documents")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (debug level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION", global = true)]
    pub config_name: Option<String>,

    /// Statistics database path (overrides the configured one)
    #[arg(long, value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch every document and its revisions, then rebuild the daily stats
    Sweep {
        /// Listing query (overrides the configured one)
        #[arg(long, value_name = "QUERY")]
        query: Option<String>,

        /// Maximum documents processed at once
        #[arg(long, value_name = "N")]
        max_workers: Option<usize>,

        /// Document API calls per second; 0 disables throttling
        #[arg(long, value_name = "N")]
        requests_per_second: Option<u32>,
    },

    /// Rebuild the daily stats from the stored document stats
    Rebuild,

    /// Show one day and the revisions that made it up
    Day {
        /// Day as YYYY-MM-DD, 'today', 'yesterday' or 'N days ago'
        date: String,
    },

    /// Show every revision of one document with its word delta
    File {
        /// Document id at the source
        id: String,
    },

    /// List the stored daily stats
    Days {
        /// Only days after this one
        #[arg(long, value_name = "DATE")]
        from: Option<String>,
    },

    /// Show the calendar and the recent-days series
    Calendar {
        /// Days in the series (overrides the configured window)
        #[arg(long, value_name = "N")]
        window: Option<usize>,
    },

    /// Count the words of a local text file
    Words {
        /// Text file to count
        file: PathBuf,
    },

    /// Show the stored user identity
    User,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {},
        _ => return Err(anyhow::anyhow!(
            "Invalid log format '{}'. Valid options: text, json", args.log_format
        )),
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {},
            _ => return Err(anyhow::anyhow!(
                "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace", level
            )),
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    match &args.command {
        Command::Sweep { max_workers: Some(0), .. } => {
            return Err(anyhow::anyhow!("--max-workers must be greater than 0"));
        }
        Command::Calendar { window: Some(0) } => {
            return Err(anyhow::anyhow!("--window must be greater than 0"));
        }
        Command::Calendar { window: Some(window) } if *window > MAX_WINDOW_DAYS => {
            return Err(anyhow::anyhow!("--window must be at most {}", MAX_WINDOW_DAYS));
        }
        _ => {}
    }

    Ok(())
}
