use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jolt_core::{Chainr, TransformOptions};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "jolt")]
#[command(about = "Run declarative JSON-to-JSON transform chains")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a chain spec against an input document
    Transform {
        /// Chain spec file: an array of {"operation", "spec"} stages
        #[arg(short, long)]
        spec: PathBuf,

        /// Input JSON file (defaults to stdin if not specified)
        input: Option<PathBuf>,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Context JSON file, readable from modify specs via '^path'
        #[arg(long)]
        context: Option<PathBuf>,

        /// First stage to run (inclusive)
        #[arg(long)]
        from: Option<usize>,

        /// Stage to stop before (exclusive)
        #[arg(long)]
        to: Option<usize>,

        /// Max spec nesting depth
        #[arg(long, default_value_t = 64)]
        max_depth: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Compile a chain spec without running it
    Check {
        /// Chain spec file
        #[arg(short, long)]
        spec: PathBuf,

        /// Max spec nesting depth
        #[arg(long, default_value_t = 64)]
        max_depth: usize,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Transform {
            spec,
            input,
            output,
            context,
            from,
            to,
            max_depth,
            format,
        } => {
            let chain = compile(&spec, max_depth)?;
            let data = match &input {
                Some(path) => read_json(path, "input")?,
                None => {
                    let mut text = String::new();
                    io::stdin()
                        .read_to_string(&mut text)
                        .context("Failed to read input from stdin")?;
                    serde_json::from_str(&text).context("Failed to parse input from stdin")?
                }
            };
            let context = match &context {
                Some(path) => read_json(path, "context")?,
                None => Value::Object(serde_json::Map::new()),
            };

            let from = from.unwrap_or(0);
            let to = to.unwrap_or(chain.len());
            let result = chain
                .transform_range(from, to, data, &context)
                .map_err(|e| anyhow::Error::from(e).context("Transform failed"))?;

            write_json(&result, output.as_ref(), format)?;
        }
        Commands::Check { spec, max_depth } => {
            let chain = compile(&spec, max_depth)?;
            let summary = serde_json::json!({
                "valid": true,
                "stages": chain.operations(),
            });
            write_json(&summary, None, OutputFormat::Compact)?;
        }
    }

    Ok(())
}

fn compile(spec: &Path, max_depth: usize) -> Result<Chainr> {
    let chain_spec = read_json(spec, "spec")?;
    let chain = Chainr::builder()
        .options(TransformOptions { max_depth })
        .build(&chain_spec)
        .map_err(|e| anyhow::Error::from(e).context(format!("Invalid chain spec: {}", spec.display())))?;
    tracing::debug!(stages = chain.len(), "compiled chain");
    Ok(chain)
}

fn read_json(path: &Path, what: &str) -> Result<Value> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {what} file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {what} from: {}", path.display()))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
