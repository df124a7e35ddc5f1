//! Logband CLI - Command-line interface for logband
//!
//! Commands:
//! - detect: Flag anomalous days for one user
//! - bands: Print the full band table for one user (unfiltered)
//! - validate: Validate access-log event schema
//! - users: List distinct user ids in the input

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use logband::pipeline::AnomalyDetector;
use logband::schema::{LogEventAdapter, SCHEMA_VERSION};
use logband::types::{BandRecord, UserId};
use logband::{JsonChart, LOGBAND_VERSION};

/// Logband - Bollinger-band anomaly detection for access-log activity
#[derive(Parser)]
#[command(name = "logband")]
#[command(version = LOGBAND_VERSION)]
#[command(about = "Flag anomalous user activity in access logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flag anomalous days for one user
    Detect {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format (defaults to pretty JSON on a terminal, NDJSON otherwise)
        #[arg(long)]
        output_format: Option<OutputFormat>,

        /// User to analyze
        #[arg(short, long)]
        user: UserId,

        /// Effective smoothing window in days
        #[arg(long)]
        span: u32,

        /// Envelope half-width in standard deviations
        #[arg(long)]
        weight: f64,

        /// Write a band.chart.v1 document of the full series to this path
        #[arg(long)]
        chart: Option<PathBuf>,
    },

    /// Print the full band table for one user (unfiltered)
    Bands {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format (defaults to pretty JSON on a terminal, NDJSON otherwise)
        #[arg(long)]
        output_format: Option<OutputFormat>,

        /// User to analyze
        #[arg(short, long)]
        user: UserId,

        /// Effective smoothing window in days
        #[arg(long)]
        span: u32,

        /// Envelope half-width in standard deviations
        #[arg(long)]
        weight: f64,
    },

    /// Validate access-log event schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List distinct user ids in the input
    Users {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output as a JSON array
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON array of events
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), LogbandCliError> {
    match cli.command {
        Commands::Detect {
            input,
            output,
            input_format,
            output_format,
            user,
            span,
            weight,
            chart,
        } => cmd_detect(
            &input,
            &output,
            input_format,
            output_format,
            user,
            span,
            weight,
            chart.as_deref(),
        ),

        Commands::Bands {
            input,
            output,
            input_format,
            output_format,
            user,
            span,
            weight,
        } => cmd_bands(&input, &output, input_format, output_format, user, span, weight),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Users {
            input,
            input_format,
            json,
        } => cmd_users(&input, input_format, json),
    }
}

fn cmd_detect(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: Option<OutputFormat>,
    user: UserId,
    span: u32,
    weight: f64,
    chart: Option<&std::path::Path>,
) -> Result<(), LogbandCliError> {
    let events = read_events(input, &input_format)?;

    let mut detector = AnomalyDetector::new(span, weight);
    if let Some(chart_path) = chart {
        let file = fs::File::create(chart_path)?;
        detector = detector.with_chart(Box::new(JsonChart::new(file)));
    }

    let anomalies = detector.detect(&events, user)?;

    let output_data = format_output(&anomalies, &resolve_format(output_format))?;
    write_output(output, &output_data)
}

fn cmd_bands(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: Option<OutputFormat>,
    user: UserId,
    span: u32,
    weight: f64,
) -> Result<(), LogbandCliError> {
    let events = read_events(input, &input_format)?;

    let detector = AnomalyDetector::new(span, weight);
    let records = detector.detect_bands(&events, user)?;

    let output_data = format_output(&records, &resolve_format(output_format))?;
    write_output(output, &output_data)
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), LogbandCliError> {
    let events = read_events(input, &input_format)?;
    let failures = LogEventAdapter::validate_events(&events);

    let report = ValidationReport {
        schema: SCHEMA_VERSION.to_string(),
        total_events: events.len(),
        valid_events: events.len() - failures.len(),
        invalid_events: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                user_id: f.user_id,
                error: f.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema:         {}", report.schema);
        println!("Total events:   {}", report.total_events);
        println!("Valid events:   {}", report.valid_events);
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Event at index {} (user {}): {}",
                    err.index, err.user_id, err.error
                );
            }
        }
    }

    if report.invalid_events > 0 {
        Err(LogbandCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

fn cmd_users(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), LogbandCliError> {
    let events = read_events(input, &input_format)?;
    let users = LogEventAdapter::user_ids(&events);

    if json {
        println!("{}", serde_json::to_string(&users)?);
    } else {
        for user in users {
            println!("{user}");
        }
    }

    Ok(())
}

// Helper functions

fn read_events(
    input: &PathBuf,
    input_format: &InputFormat,
) -> Result<Vec<logband::AccessEvent>, LogbandCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let events = match input_format {
        InputFormat::Ndjson => LogEventAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => LogEventAdapter::parse_array(&input_data)?,
    };

    if events.is_empty() {
        return Err(LogbandCliError::NoEvents);
    }

    Ok(events)
}

fn resolve_format(format: Option<OutputFormat>) -> OutputFormat {
    match format {
        Some(f) => f,
        None if atty::is(atty::Stream::Stdout) => OutputFormat::JsonPretty,
        None => OutputFormat::Ndjson,
    }
}

fn format_output(records: &[BandRecord], format: &OutputFormat) -> Result<String, LogbandCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

fn write_output(output: &PathBuf, data: &str) -> Result<(), LogbandCliError> {
    if output.to_string_lossy() == "-" {
        print!("{data}");
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum LogbandCliError {
    Io(io::Error),
    Detect(logband::DetectError),
    Json(serde_json::Error),
    NoEvents,
    ValidationFailed(usize),
}

impl From<io::Error> for LogbandCliError {
    fn from(e: io::Error) -> Self {
        LogbandCliError::Io(e)
    }
}

impl From<logband::DetectError> for LogbandCliError {
    fn from(e: logband::DetectError) -> Self {
        LogbandCliError::Detect(e)
    }
}

impl From<serde_json::Error> for LogbandCliError {
    fn from(e: serde_json::Error) -> Self {
        LogbandCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LogbandCliError> for CliError {
    fn from(e: LogbandCliError) -> Self {
        match e {
            LogbandCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LogbandCliError::Detect(e) => CliError {
                code: "DETECT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the user id and the span/weight parameters".to_string()),
            },
            LogbandCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            LogbandCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            LogbandCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} events failed validation"),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema: String,
    total_events: usize,
    valid_events: usize,
    invalid_events: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    user_id: UserId,
    error: String,
}
