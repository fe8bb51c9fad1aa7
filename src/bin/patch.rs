//! patch - apply a source document onto a target document
//!
//! Merges two YAML/JSON files field by field as declared by a merge schema,
//! writes the merged document and reports what changed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use field_patcher::{DocumentProcessor, UpdateResult};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "patch", version, about = "Apply a source document onto a target document")]
struct Cli {
    /// Path to the merge schema (YAML or JSON)
    #[arg(short, long)]
    schema: PathBuf,

    /// Name of the type in the schema to merge as (default: schema root)
    #[arg(short = 't', long = "type")]
    type_name: Option<String>,

    /// Document to update
    #[arg(long)]
    target: PathBuf,

    /// Document supplying the new values
    #[arg(long)]
    source: PathBuf,

    /// Output location. Use '-' for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Format of the merged document
    #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
    format: Format,

    /// Format of the change report written to stderr
    #[arg(short, long, value_enum, default_value_t = Report::Text)]
    report: Report,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Report {
    Text,
    Json,
    Off,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let schema = fs::read_to_string(&cli.schema)
        .with_context(|| format!("Failed to read schema file {:?}", cli.schema))?;
    let processor = DocumentProcessor::from_yaml(&schema).context("Failed to load schema")?;

    let type_name = cli
        .type_name
        .unwrap_or_else(|| processor.root_type().to_string());

    let mut target = read_document(&cli.target)?;
    let source = read_document(&cli.source)?;

    let result = apply(&processor, &type_name, &mut target, &source)?;

    let rendered = match cli.format {
        Format::Yaml => serde_yaml::to_string(&target).context("Failed to serialize result")?,
        Format::Json => {
            let mut json =
                serde_json::to_string_pretty(&target).context("Failed to serialize result")?;
            json.push('\n');
            json
        }
    };

    if cli.output == "-" {
        io::stdout().write_all(rendered.as_bytes())?;
    } else {
        fs::write(&cli.output, rendered)
            .with_context(|| format!("Failed to write output file {:?}", cli.output))?;
    }

    write_report(cli.report, &result, &mut io::stderr())
}

fn apply(
    processor: &DocumentProcessor,
    type_name: &str,
    target: &mut Value,
    source: &Value,
) -> Result<UpdateResult> {
    if processor.processor(type_name).is_none() {
        bail!("Type '{}' not found in schema", type_name);
    }
    processor
        .execute_as(type_name, target, source)
        .context("Patch failed")
}

fn read_document(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse file {:?}", path))
}

fn write_report(report: Report, result: &UpdateResult, output: &mut dyn Write) -> Result<()> {
    match report {
        Report::Off => {}
        Report::Json => {
            serde_json::to_writer_pretty(&mut *output, result)?;
            writeln!(output)?;
        }
        Report::Text if !result.has_updates() => {
            writeln!(output, "No changes")?;
        }
        Report::Text => {
            writeln!(output, "Changes: {}", result)?;
            for path in result.paths() {
                writeln!(output, "  ~ {}", path)?;
            }
        }
    }
    Ok(())
}
