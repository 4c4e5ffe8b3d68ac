//! protodoc - Inspect the documentation model of Protocol Buffer descriptors
//!
//! This tool loads a descriptor set written by `protoc` (or a serialized
//! plugin request), builds the documentation model and prints it as JSON
//! or as a short per-package summary.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use protodoc_core::{DescriptorSet, Model, ModelBuilder, ModelConfig};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Build the documentation model of Protocol Buffer descriptors
#[derive(Parser, Debug)]
#[command(name = "protodoc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Only document these files (repeatable, in output order)
    #[arg(long = "file", value_name = "NAME")]
    files: Vec<String>,

    /// Comments starting with this marker get an empty description
    #[arg(long, value_name = "TEXT")]
    exclude_marker: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a FileDescriptorSet (protoc --include_source_info -o)
    #[arg(short, long, value_name = "PATH")]
    descriptor_set: Option<PathBuf>,

    /// Path to a serialized CodeGeneratorRequest
    #[arg(short, long, value_name = "PATH")]
    request: Option<PathBuf>,
}

/// Output format for the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The full model as JSON
    Json,
    /// Per-package declaration counts
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let set = load_descriptors(&cli)?;
    let model = build_model(&cli, &set);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_model(&model, cli.format, cli.pretty, &mut out)
}

/// Loads the descriptor input selected on the command line
fn load_descriptors(cli: &Cli) -> Result<DescriptorSet> {
    let set = if let Some(ref path) = cli.input.descriptor_set {
        let data = read_input(path)?;
        DescriptorSet::decode(data.as_slice())
            .with_context(|| format!("Failed to decode descriptor set {}", path.display()))?
    } else if let Some(ref path) = cli.input.request {
        let data = read_input(path)?;
        let set = DescriptorSet::from_code_generator_request(data.as_slice())
            .with_context(|| format!("Failed to decode plugin request {}", path.display()))?;
        if let Some(parameter) = set.parameter() {
            debug!("Plugin parameter: {}", parameter);
        }
        set
    } else {
        bail!("Either --descriptor-set or --request must be specified")
    };

    if cli.files.is_empty() {
        return Ok(set);
    }
    set.with_targets(&cli.files)
        .context("Failed to select the files to document")
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        bail!("Input file does not exist: {}", path.display());
    }
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    info!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

fn build_model(cli: &Cli, set: &DescriptorSet) -> Model {
    let mut config = ModelConfig::new();
    if let Some(ref marker) = cli.exclude_marker {
        config = config.exclude_marker(marker.as_str());
    }
    let model = ModelBuilder::new(config).build(set);
    info!(
        "Built model with {} file(s) and {} package(s)",
        model.files().len(),
        model.packages().len()
    );
    model
}

fn write_model<W: Write>(
    model: &Model,
    format: OutputFormat,
    pretty: bool,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            if pretty {
                serde_json::to_writer_pretty(&mut *out, model)?;
            } else {
                serde_json::to_writer(&mut *out, model)?;
            }
            writeln!(out)?;
        }
        OutputFormat::Summary => write_summary(model, out)?,
    }
    Ok(())
}

fn write_summary<W: Write>(model: &Model, out: &mut W) -> io::Result<()> {
    for package in model.packages() {
        let name = if package.name.is_empty() {
            "(no package)"
        } else {
            package.name.as_str()
        };
        writeln!(
            out,
            "{}: {} message(s), {} enum(s), {} service(s)",
            name,
            package.listed_messages().count(),
            package.enums.len(),
            package.services.len()
        )?;
    }
    writeln!(
        out,
        "Total: {} file(s), {} package(s), {} linked type(s)",
        model.files().len(),
        model.packages().len(),
        model.links().len()
    )
}
