//! CLI tool to convert a TSV file into an Arrow IPC stream, or summarize an existing stream.
//!
//! Usage:
//!   tsv-arrows convert [data.tsv] [data.arrows] [--config options.json] [--verbose] [--log-file convert.log]
//!   tsv-arrows inspect <data.arrows>

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use tsv_arrows::artifact::{from_record_batches, read_batches};
use tsv_arrows::pipeline::{
    convert_path, CompositeObserver, FileObserver, PipelineObserver, PipelineOptions,
    StdErrObserver,
};
use tsv_arrows::types::Column;
use tsv_arrows::PipelineResult;

#[derive(Parser)]
#[command(
    name = "tsv-arrows",
    version,
    about = "Convert a TSV table into a sorted Arrow IPC stream"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a TSV file into an Arrow IPC stream
    Convert {
        /// Input TSV file
        #[arg(default_value = "data.tsv")]
        source: PathBuf,
        /// Output artifact (replaced only when complete)
        #[arg(default_value = "data.arrows")]
        target: PathBuf,
        /// JSON file overriding pipeline options
        #[arg(long)]
        config: Option<PathBuf>,
        /// Log each stage to stderr
        #[arg(short, long)]
        verbose: bool,
        /// Append stage and outcome lines to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Print the schema, row count, batch count and date range of an artifact
    Inspect {
        /// Artifact to read
        artifact: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Convert {
            source,
            target,
            config,
            verbose,
            log_file,
        } => convert(source, target, config, verbose, log_file),
        Command::Inspect { artifact } => inspect(artifact),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn convert(
    source: PathBuf,
    target: PathBuf,
    config: Option<PathBuf>,
    verbose: bool,
    log_file: Option<PathBuf>,
) -> PipelineResult<()> {
    let mut options = match config {
        Some(path) => PipelineOptions::from_json_path(path)?,
        None => PipelineOptions::default(),
    };

    let mut observers: Vec<Arc<dyn PipelineObserver>> = Vec::new();
    if verbose {
        observers.push(Arc::new(StdErrObserver));
    }
    if let Some(path) = log_file {
        observers.push(Arc::new(FileObserver::new(path)));
    }
    if !observers.is_empty() {
        options.observer = Some(Arc::new(CompositeObserver::new(observers)));
    }

    let stats = convert_path(&source, &target, &options)?;
    eprintln!(
        "Processed {} -> {} rows in {} batches ({} dictionary values), output: {}",
        source.display(),
        stats.rows,
        stats.batches,
        stats.dictionary_values,
        target.display()
    );
    Ok(())
}

fn inspect(artifact: PathBuf) -> PipelineResult<()> {
    let (schema, batches) = read_batches(BufReader::new(File::open(&artifact)?))?;
    let table = from_record_batches(&schema, &batches)?;

    println!("{}", artifact.display());
    println!("schema:");
    for f in schema.fields() {
        let null = if f.is_nullable() { "" } else { " not null" };
        println!("  {}: {}{null}", f.name(), f.data_type());
    }
    println!("rows: {}", table.row_count());
    println!("batches: {}", batches.len());

    if let Some(Column::UInt32(dates)) = table.column("date") {
        let first = dates.iter().flatten().next();
        let last = dates.iter().flatten().next_back();
        if let (Some(first), Some(last)) = (first, last) {
            println!("date range: {first}..={last}");
        }
    }
    Ok(())
}
