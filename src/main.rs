// Command-line front end: scans MRZ text or OCR/LLM responses from files
// (or stdin) and prints the records as JSON or CSV.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use log::{error, info};
use serde::Serialize;

use mrzscan::export::CsvExporter;
use mrzscan::models::{MrzRecord, ScanResult};
use mrzscan::scanner::log_failures;
use mrzscan::{DocumentScanner, ScanConfig, ScanError, ScanMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputMode {
    /// Decode an MRZ block when one is found, otherwise read a response
    Auto,
    /// Input is MRZ text
    Mrz,
    /// Input is a JSON/CSV answer from an OCR/LLM service
    Response,
}

impl From<InputMode> for ScanMode {
    fn from(mode: InputMode) -> Self {
        match mode {
            InputMode::Auto => ScanMode::Auto,
            InputMode::Mrz => ScanMode::Mrz,
            InputMode::Response => ScanMode::Response,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mrzscan", version, about = "Extract MRZ records from scanned identity document text")]
struct Args {
    /// Text files to scan, one document each. Reads stdin when none are given
    files: Vec<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Date the century heuristics are anchored to (YYYY-MM-DD)
    #[arg(long)]
    reference_date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[arg(long, value_enum, default_value_t = InputMode::Auto)]
    mode: InputMode,

    /// Rewrite OCR-confusable characters in numeric and alphabetic MRZ fields
    #[arg(long)]
    correct_confusables: bool,

    /// Omit the UTF-8 byte order mark from CSV output
    #[arg(long)]
    no_bom: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportEntry<'a> {
    file_name: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mrz_data: Option<&'a MrzRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every input produced a record.
fn run(args: Args) -> Result<bool, ScanError> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_file(path)?,
        None => ScanConfig::default(),
    };
    if args.reference_date.is_some() {
        config.reference_date = args.reference_date;
    }
    if args.correct_confusables {
        config.correct_confusables = true;
    }
    if args.no_bom {
        config.csv_bom = false;
    }
    config.validate()?;

    let scanner = DocumentScanner::new(&config).with_mode(args.mode.into());
    let results = scan_inputs(&scanner, &args.files)?;
    log_failures(&results);
    info!("Scanned {} input(s)", results.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Csv => {
            CsvExporter::new(config.csv_bom).write(&results, &mut out)?;
        }
        OutputFormat::Json => {
            let report: Vec<ReportEntry> = results.iter().map(report_entry).collect();
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| ScanError::IoError(format!("Failed to serialize report: {}", e)))?;
            writeln!(out, "{}", json).map_err(|e| ScanError::IoError(format!("Failed to write report: {}", e)))?;
        }
    }

    Ok(results.iter().all(ScanResult::is_success))
}

/// Scans each file in argument order, or stdin when no files are given.
/// A file that cannot be read becomes a failed result in its place.
fn scan_inputs(scanner: &DocumentScanner, files: &[PathBuf]) -> Result<Vec<ScanResult>, ScanError> {
    if files.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| ScanError::IoError(format!("Failed to read stdin: {}", e)))?;
        return Ok(vec![scanner.scan_document("<stdin>", &text)]);
    }

    let results = files
        .iter()
        .map(|path| {
            let file_name = path.display().to_string();
            match std::fs::read_to_string(path) {
                Ok(text) => scanner.scan_document(file_name, &text),
                Err(e) => {
                    error!("Failed to read {}: {}", file_name, e);
                    ScanResult {
                        file_name,
                        outcome: Err(ScanError::IoError(e.to_string())),
                    }
                }
            }
        })
        .collect();
    Ok(results)
}

fn report_entry(result: &ScanResult) -> ReportEntry<'_> {
    match &result.outcome {
        Ok(record) => ReportEntry {
            file_name: &result.file_name,
            status: "success",
            mrz_data: Some(record),
            error: None,
        },
        Err(err) => ReportEntry {
            file_name: &result.file_name,
            status: "error",
            mrz_data: None,
            error: Some(err.to_string()),
        },
    }
}
