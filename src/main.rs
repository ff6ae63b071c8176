//! docsign command line interface
//!
//! Local access to the form engine and the signature field layout:
//! list the fields of a PDF, fill and lock them, or reserve room for the
//! next visible signature.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueEnum};
use docsign::config::ServiceConfig;
use docsign::forms;
use docsign::layout::SignatureFieldAllocator;
use docsign::requests::FormUpdateRequest;
use docsign::types::DssDocument;
use docsign::utils::init_logging;
use docsign::{Error, PdfDocument, Result};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages (default)
    Info,
    /// Debug and all messages
    Debug,
    /// Trace and all messages (most verbose)
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let level = matches
        .get_one::<LogLevel>("verbose")
        .copied()
        .unwrap_or(LogLevel::Info);
    if let Err(e) = init_logging(level.as_str()) {
        eprintln!("{}", e);
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => match ServiceConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config file: {}", e);
                process::exit(1);
            }
        },
        None => ServiceConfig::default(),
    };

    let outcome = match matches.subcommand() {
        Some(("fields", sub)) => run_fields(sub).await,
        Some(("fill", sub)) => run_fill(sub).await,
        Some(("place", sub)) => run_place(sub, &config).await,
        _ => Err(Error::InvalidInput("Unknown command".into())),
    };

    if let Err(e) = outcome {
        error!("{}", e);
        process::exit(1);
    }
}

fn build_cli() -> Command {
    let input = Arg::new("input")
        .short('i')
        .long("input")
        .value_name("FILE")
        .help("Input PDF file path")
        .required(true);
    let output = Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .help("Output PDF file path")
        .required(true);
    let force = Arg::new("force")
        .long("force")
        .help("Overwrite the output file if it exists")
        .action(ArgAction::SetTrue);

    Command::new("docsign")
        .version(env!("CARGO_PKG_VERSION"))
        .about("PDF form filling and signature field placement")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file (JSON/YAML)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .value_name("LEVEL")
                .global(true)
                .value_parser(clap::builder::EnumValueParser::<LogLevel>::new())
                .help("Logging verbosity"),
        )
        .subcommand(
            Command::new("fields")
                .about("List the form fields of a PDF as JSON")
                .arg(input.clone()),
        )
        .subcommand(
            Command::new("fill")
                .about("Fill form fields and make them read-only")
                .arg(input.clone())
                .arg(output.clone())
                .arg(
                    Arg::new("values")
                        .long("values")
                        .value_name("JSON")
                        .help("JSON object mapping field names to values")
                        .conflicts_with("values-file")
                        .required_unless_present("values-file"),
                )
                .arg(
                    Arg::new("values-file")
                        .long("values-file")
                        .value_name("FILE")
                        .help("File holding the JSON object of field values"),
                )
                .arg(force.clone()),
        )
        .subcommand(
            Command::new("place")
                .about("Compute the next signature field position, adding a page if needed")
                .arg(input)
                .arg(output)
                .arg(force),
        )
}

async fn run_fields(matches: &ArgMatches) -> Result<()> {
    let input = required_path(matches, "input")?;
    let bytes = tokio::fs::read(&input).await?;
    let fields = forms::list_fields(&bytes)?;
    println!("{}", to_json(&fields)?);
    Ok(())
}

async fn run_fill(matches: &ArgMatches) -> Result<()> {
    let input = required_path(matches, "input")?;
    let output = required_path(matches, "output")?;
    check_output(&output, matches.get_flag("force"))?;

    let values = match (
        matches.get_one::<String>("values"),
        matches.get_one::<String>("values-file"),
    ) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await?,
        (None, None) => return Err(Error::InvalidInput("No field values given".into())),
    };

    let bytes = tokio::fs::read(&input).await?;
    let request = FormUpdateRequest::from_json_values(DssDocument::new(bytes), &values)?;
    let (document, report) = forms::fill_form(&request)?;

    tokio::fs::write(&output, &document.bytes).await?;
    info!(
        "Filled {} field(s) into {}",
        report.applied.len(),
        output.display()
    );
    println!("{}", to_json(&report)?);
    Ok(())
}

async fn run_place(matches: &ArgMatches, config: &ServiceConfig) -> Result<()> {
    let input = required_path(matches, "input")?;
    let output = required_path(matches, "output")?;
    check_output(&output, matches.get_flag("force"))?;

    let bytes = tokio::fs::read(&input).await?;
    let mut document = PdfDocument::load(&bytes)?;
    let allocation = SignatureFieldAllocator::new(&config.layout).allocate(&mut document)?;

    let written = if allocation.document_modified {
        document.save()?
    } else {
        bytes
    };
    tokio::fs::write(&output, &written).await?;

    println!("{}", to_json(&allocation.placement)?);
    Ok(())
}

fn required_path(matches: &ArgMatches, name: &str) -> Result<PathBuf> {
    matches
        .get_one::<String>(name)
        .map(PathBuf::from)
        .ok_or_else(|| Error::InvalidInput(format!("Missing --{}", name)))
}

fn check_output(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::InvalidInput(format!(
            "Output file already exists: {} (use --force to overwrite)",
            path.display()
        )));
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::InvalidInput(format!("Unable to render JSON: {}", e)))
}
