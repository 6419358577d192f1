//! Command-line parsing for the batch geocoder.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and presentation code.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::geocode::google::{API_KEY_ENV, DEFAULT_ENDPOINT};
use crate::io::ingest::DEFAULT_ADDRESS_COLUMN;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "geobatch", version, about = "Batch geocoder for CSV address lists")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Geocode every address in a CSV file and print a classified table.
    Run(RunArgs),
    /// Geocode a CSV file in an interactive terminal view.
    ///
    /// Press `q` or `Esc` to stop before the next call.
    Tui(RunArgs),
    /// Classify a saved geocoding JSON response without calling the service.
    Classify(ClassifyArgs),
}

/// Options shared by `run` and `tui`.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// CSV file with a header row.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Header of the column holding the address text (case-insensitive).
    #[arg(long, default_value = DEFAULT_ADDRESS_COLUMN)]
    pub address_column: String,

    /// Pause before every geocoding call, in milliseconds.
    #[arg(long, default_value_t = 600)]
    pub delay_ms: u64,

    /// Give up on a single call after this many seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Geocoding API key.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Geocoding endpoint URL.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Region bias passed to the service (ccTLD, e.g. `uk`).
    #[arg(long)]
    pub region: Option<String>,

    /// Language for formatted addresses (e.g. `en`).
    #[arg(long)]
    pub language: Option<String>,

    /// Export classified rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Append log output to this file (the only way to get logs from `tui`).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl RunArgs {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Options for offline classification.
#[derive(Debug, Parser)]
pub struct ClassifyArgs {
    /// JSON body as returned by the geocoding service.
    #[arg(value_name = "JSON")]
    pub response: PathBuf,

    /// Address text to label the result with.
    #[arg(long, default_value = "")]
    pub address: String,
}
