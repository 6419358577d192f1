//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - ingests the address CSV
//! - runs the geocoding pipeline against the chosen front-end
//! - writes optional exports

use std::fs::OpenOptions;
use std::path::PathBuf;

use clap::Parser;

use crate::cli::{ClassifyArgs, Command, RunArgs};
use crate::error::AppError;
use crate::geocode::{GoogleGeocoder, GoogleSettings, classify_outcome, normalize};
use crate::report::TerminalTable;
use crate::throttle::CancelToken;

pub mod pipeline;

/// Entry point for the `geobatch` binary.
pub fn run() -> Result<(), AppError> {
    // Load `.env` before parsing so clap's `env` fallbacks can see it.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(log_destination(&cli.command))?;

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Tui(args) => handle_tui(args),
        Command::Classify(args) => handle_classify(args),
    }
}

const DEFAULT_LOG_LEVEL: &str = "info";

/// Where log records go for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogDestination {
    Stderr,
    File(PathBuf),
    /// The TUI owns the terminal; stderr writes would corrupt the frame.
    Off,
}

fn log_destination(command: &Command) -> LogDestination {
    match command {
        Command::Run(args) => args
            .log_file
            .clone()
            .map_or(LogDestination::Stderr, LogDestination::File),
        Command::Tui(args) => args
            .log_file
            .clone()
            .map_or(LogDestination::Off, LogDestination::File),
        Command::Classify(_) => LogDestination::Stderr,
    }
}

fn init_logging(destination: LogDestination) -> Result<(), AppError> {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_LOG_LEVEL);
    let mut builder = env_logger::Builder::from_env(env);
    builder.format_timestamp_millis();

    match destination {
        // No logger installed: every record is discarded, RUST_LOG included.
        LogDestination::Off => return Ok(()),
        LogDestination::Stderr => {}
        LogDestination::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| AppError::input(format!("Failed to open log file '{}': {e}", path.display())))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }

    // A second init (e.g. from tests) is harmless.
    let _ = builder.try_init();
    Ok(())
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let ingested = crate::io::ingest::load_addresses(&args.csv, &args.address_column)?;
    let geocoder = geocoder_from_args(&args)?;

    let mut table = TerminalTable::new(std::io::stdout());
    let run = pipeline::run_pipeline(
        &ingested.records,
        &geocoder,
        &mut table,
        args.delay(),
        &CancelToken::new(),
    );

    println!("{}", crate::report::format_run_summary(&run.summary));

    if let Some(path) = &args.export {
        crate::io::export::write_results_csv(path, &run.rows)?;
    }

    Ok(())
}

fn handle_tui(args: RunArgs) -> Result<(), AppError> {
    let ingested = crate::io::ingest::load_addresses(&args.csv, &args.address_column)?;
    let geocoder = geocoder_from_args(&args)?;

    let title = args.csv.display().to_string();
    let run = crate::tui::run(title, ingested.records, geocoder, args.delay())?;

    println!("{}", crate::report::format_run_summary(&run.summary));

    if let Some(path) = &args.export {
        crate::io::export::write_results_csv(path, &run.rows)?;
    }

    Ok(())
}

fn handle_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let body = std::fs::read_to_string(&args.response).map_err(|e| {
        AppError::input(format!(
            "Failed to read response JSON '{}': {e}",
            args.response.display()
        ))
    })?;
    let response = crate::geocode::google::parse_response_body(&body)
        .map_err(|e| AppError::input(format!("Invalid geocoding response JSON: {e}")))?;

    let outcome = normalize(response);
    match classify_outcome(&args.address, &outcome) {
        Some(result) => print!("{}", crate::report::format_classification(&result)),
        None => println!("status: OVER_QUERY_LIMIT (would be retried)"),
    }
    Ok(())
}

fn geocoder_from_args(args: &RunArgs) -> Result<GoogleGeocoder, AppError> {
    let api_key = GoogleGeocoder::api_key_from(args.api_key.clone())?;
    GoogleGeocoder::new(GoogleSettings {
        api_key,
        endpoint: args.endpoint.clone(),
        timeout: args.timeout(),
        region: args.region.clone(),
        language: args.language.clone(),
    })
}

/// Rewrite argv so a bare CSV path means `run`.
///
/// Rules:
/// - `geobatch file.csv ...`          -> `geobatch run file.csv ...`
/// - subcommands, flags and no args   -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1) else {
        return argv;
    };

    let is_subcommand = matches!(arg1.as_str(), "run" | "tui" | "classify" | "help");
    if is_subcommand || arg1.starts_with('-') {
        return argv;
    }

    argv.insert(1, "run".to_string());
    argv
}
