//! Biotrace CLI - replay tooling for recorded capture sessions
//!
//! Commands:
//! - summarize: Replay a recorded session into its biometric summary
//! - validate: Validate recorded events against the capture schema
//! - doctor: Diagnose configuration and baseline files
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use biotrace::pipeline::{replay_summary, BiometricProcessor};
use biotrace::schema::{self, InputEvent, RecordedSession};
use biotrace::{BIOTRACE_VERSION, PRODUCER_NAME, SCHEMA_VERSION};

/// Biotrace - behavioral biometric capture engine
#[derive(Parser)]
#[command(name = "biotrace")]
#[command(author = "Biotrace Labs")]
#[command(version = BIOTRACE_VERSION)]
#[command(about = "Replay recorded login captures into biometric summaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded session into its biometric summary
    Summarize {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "session")]
        input_format: InputFormat,

        /// Compact instead of pretty-printed JSON
        #[arg(long)]
        compact: bool,

        /// User agent recorded for event-only inputs
        #[arg(long, default_value = "unknown")]
        user_agent: String,

        /// Screen width recorded for event-only inputs
        #[arg(long, default_value = "0")]
        screen_width: u32,

        /// Screen height recorded for event-only inputs
        #[arg(long, default_value = "0")]
        screen_height: u32,

        /// Score the summary against this user's baseline profile
        #[arg(long)]
        user: Option<String>,

        /// Load baselines from file before scoring
        #[arg(long)]
        load_baselines: Option<PathBuf>,

        /// Save baselines to file after scoring
        #[arg(long)]
        save_baselines: Option<PathBuf>,
    },

    /// Validate recorded events against the capture schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "session")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and baseline files
    Doctor {
        /// Check a baselines file
        #[arg(long)]
        baselines: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// A full recorded session document (auth.capture_session.v1)
    Session,
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON array of events
    Json,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (auth.capture_session.v1)
    Input,
    /// Output schema (the wire summary)
    Output,
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

fn run(cli: Cli) -> Result<(), BiotraceCliError> {
    match cli.command {
        Commands::Summarize {
            input,
            output,
            input_format,
            compact,
            user_agent,
            screen_width,
            screen_height,
            user,
            load_baselines,
            save_baselines,
        } => cmd_summarize(
            &input,
            &output,
            input_format,
            compact,
            &user_agent,
            screen_width,
            screen_height,
            user.as_deref(),
            load_baselines.as_deref(),
            save_baselines.as_deref(),
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { baselines, json } => cmd_doctor(baselines.as_deref(), json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_summarize(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    compact: bool,
    user_agent: &str,
    screen_width: u32,
    screen_height: u32,
    user: Option<&str>,
    load_baselines: Option<&Path>,
    save_baselines: Option<&Path>,
) -> Result<(), BiotraceCliError> {
    let input_data = read_input(input)?;
    let session = read_session(
        &input_data,
        input_format,
        user_agent,
        screen_width,
        screen_height,
    )?;

    let output_data = match user {
        None => {
            let summary = replay_summary(&session);
            if compact {
                serde_json::to_string(&summary)?
            } else {
                serde_json::to_string_pretty(&summary)?
            }
        }
        Some(username) => {
            let mut processor = BiometricProcessor::new();

            if let Some(baselines_path) = load_baselines {
                let baselines_json = fs::read_to_string(baselines_path)?;
                processor.load_baselines(&baselines_json)?;
            }

            let session_json = serde_json::to_string(&session)?;
            let analysis = processor.process(username, &session_json)?;

            if let Some(baselines_path) = save_baselines {
                fs::write(baselines_path, processor.save_baselines()?)?;
            }

            if compact {
                serde_json::to_string(&analysis)?
            } else {
                serde_json::to_string_pretty(&analysis)?
            }
        }
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), BiotraceCliError> {
    let input_data = read_input(input)?;
    let events = read_events(&input_data, input_format)?;

    let failures = schema::validate_events(&events);

    let report = ValidationReport {
        total_events: events.len(),
        valid_events: events.len() - failures.len(),
        invalid_events: failures.len(),
        errors: failures,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!("Valid events:   {}", report.valid_events);
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Event {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_events > 0 {
        Err(BiotraceCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

fn cmd_doctor(baselines: Option<&Path>, json: bool) -> Result<(), BiotraceCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "biotrace_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Biotrace version {}", BIOTRACE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    if let Some(baselines_path) = baselines {
        if baselines_path.exists() {
            match fs::read_to_string(baselines_path) {
                Ok(content) => match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(value) => {
                        let profiles = value
                            .get("profiles")
                            .and_then(|v| v.as_object())
                            .map(|m| m.len())
                            .unwrap_or(0);
                        checks.push(DoctorCheck {
                            name: "baselines".to_string(),
                            status: CheckStatus::Ok,
                            message: format!("Baselines file valid ({} user profiles)", profiles),
                        });
                    }
                    Err(e) => {
                        checks.push(DoctorCheck {
                            name: "baselines".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Invalid baselines JSON: {}", e),
                        });
                    }
                },
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "baselines".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Cannot read baselines file: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "baselines".to_string(),
                status: CheckStatus::Warning,
                message: "Baselines file does not exist".to_string(),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: BIOTRACE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Biotrace Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(BiotraceCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), BiotraceCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: {}", SCHEMA_VERSION);
            println!();
            println!("A recorded session document contains:");
            println!();
            println!("- schema_version, capture_id, started_at");
            println!("- user_agent, screen_width, screen_height");
            println!("- events: array of interaction events, each with:");
            println!("  - timestamp (RFC 3339)");
            println!("  - event_type: pointer_move | key_down | key_up");
            println!("  - pointer: {{ x, y, page_x, page_y }} on pointer_move");
            println!("  - key: {{ key, code, repeat }} on key events");
        }
        SchemaType::Output => {
            println!("Output Schema: biometric summary (wire format)");
            println!();
            println!("The summary attached to a login request contains:");
            println!();
            println!("- sessionDuration: elapsed milliseconds");
            println!("- mouse: {{ movementCount, avgVelocity, totalDistance, movementPattern }}");
            println!("- keyboard: {{ keystrokeCount, avgDwellTime, avgFlightTime, keysPressed }}");
            println!("- userAgent, screenResolution (\"WxH\"), timestamp (RFC 3339)");
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, BiotraceCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_events(data: &str, input_format: InputFormat) -> Result<Vec<InputEvent>, BiotraceCliError> {
    let events = match input_format {
        InputFormat::Session => schema::parse_session(data)?.events,
        InputFormat::Ndjson => schema::parse_ndjson(data)?,
        InputFormat::Json => schema::parse_array(data)?,
    };
    Ok(events)
}

fn read_session(
    data: &str,
    input_format: InputFormat,
    user_agent: &str,
    screen_width: u32,
    screen_height: u32,
) -> Result<RecordedSession, BiotraceCliError> {
    match input_format {
        InputFormat::Session => Ok(schema::parse_session(data)?),
        InputFormat::Ndjson | InputFormat::Json => {
            let events = read_events(data, input_format)?;
            let started_at = events
                .first()
                .map(|event| event.timestamp)
                .ok_or(BiotraceCliError::NoEvents)?;

            let mut session =
                RecordedSession::new(user_agent, screen_width, screen_height, started_at);
            session.events = events;
            Ok(session)
        }
    }
}

// Error types

#[derive(Debug)]
enum BiotraceCliError {
    Io(io::Error),
    Capture(biotrace::CaptureError),
    Json(serde_json::Error),
    NoEvents,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for BiotraceCliError {
    fn from(e: io::Error) -> Self {
        BiotraceCliError::Io(e)
    }
}

impl From<biotrace::CaptureError> for BiotraceCliError {
    fn from(e: biotrace::CaptureError) -> Self {
        BiotraceCliError::Capture(e)
    }
}

impl From<serde_json::Error> for BiotraceCliError {
    fn from(e: serde_json::Error) -> Self {
        BiotraceCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BiotraceCliError> for CliError {
    fn from(e: BiotraceCliError) -> Self {
        match e {
            BiotraceCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BiotraceCliError::Capture(e) => CliError {
                code: "CAPTURE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches auth.capture_session.v1".to_string()),
            },
            BiotraceCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BiotraceCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            BiotraceCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} events failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            BiotraceCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_events: usize,
    valid_events: usize,
    invalid_events: usize,
    errors: Vec<schema::ValidationFailure>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
