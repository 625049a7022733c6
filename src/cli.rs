//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::{CsvDirSource, CsvFileSource, CsvRowSink};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter::JsonFileSource;
use crate::domain::cleaner::{Cleaner, CleanerConfig};
use crate::domain::config_validation::{self, validate_pipeline_config};
use crate::domain::engine::{EngineConfig, IndicatorEngine};
use crate::domain::error::PipelineError;
use crate::domain::pipeline::Pipeline;
use crate::ports::config_port::ConfigPort;
use crate::ports::record_source::RecordSource;
use crate::ports::row_sink::RowSink;

pub const DEFAULT_UNDEFINED_MARKER: &str = "NaN";

#[derive(Parser, Debug)]
#[command(name = "pricewash", about = "Clean price history and annotate it with SMA and RSI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dedupe, gap-fill and validate a raw price batch
    Clean {
        /// CSV file, JSON file, or directory of <SYMBOL>.csv files
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Vec<String>,
    },
    /// Clean a batch and add moving averages and RSI per symbol
    Annotate {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Vec<String>,
    },
    /// Validate a pipeline configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// How undefined indicator values and numbers are rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub undefined: String,
    pub precision: Option<usize>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Clean {
            input,
            output,
            config,
            symbol,
        } => run_clean(&input, output.as_deref(), config.as_deref(), symbol),
        Command::Annotate {
            input,
            output,
            config,
            symbol,
        } => run_annotate(&input, output.as_deref(), config.as_deref(), symbol),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Loads and validates the config, falling back to defaults without a file.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, PipelineError> {
    let adapter = match path {
        Some(p) => FileConfigAdapter::from_file(p)?,
        None => FileConfigAdapter::empty(),
    };
    validate_pipeline_config(&adapter)?;
    info!(config = %adapter.origin(), "loaded config");
    Ok(adapter)
}

pub fn build_cleaner_config(config: &dyn ConfigPort) -> CleanerConfig {
    match config.get_list("cleaner", "date_formats") {
        Some(formats) if !formats.is_empty() => CleanerConfig {
            date_formats: formats,
        },
        _ => CleanerConfig::default(),
    }
}

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, PipelineError> {
    let defaults = EngineConfig::default();
    Ok(EngineConfig {
        sma_periods: config_validation::sma_periods(config)?.unwrap_or(defaults.sma_periods),
        rsi_period: config_validation::rsi_period(config)?.unwrap_or(defaults.rsi_period),
        parallel: config_validation::parallel(config)?.unwrap_or(defaults.parallel),
    })
}

pub fn build_output_config(config: &dyn ConfigPort) -> Result<OutputConfig, PipelineError> {
    Ok(OutputConfig {
        undefined: config
            .get_string("output", "undefined")
            .unwrap_or_else(|| DEFAULT_UNDEFINED_MARKER.to_string()),
        precision: config_validation::float_precision(config)?,
    })
}

pub fn build_pipeline(
    config: &dyn ConfigPort,
    symbols: Vec<String>,
) -> Result<Pipeline, PipelineError> {
    let cleaner = Cleaner::new(build_cleaner_config(config));
    let engine = IndicatorEngine::new(&build_engine_config(config)?);
    Ok(Pipeline::new(cleaner, engine).with_symbols(symbols))
}

/// Picks a source by input kind: directory, `.json` file, or CSV file.
pub fn open_source(input: &Path, symbols: &[String]) -> Box<dyn RecordSource> {
    if input.is_dir() {
        return Box::new(CsvDirSource::new(input.to_path_buf(), symbols.to_vec()));
    }
    let is_json = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Box::new(JsonFileSource::new(input.to_path_buf()))
    } else {
        Box::new(CsvFileSource::new(input.to_path_buf()))
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, PipelineError> {
    Ok(match path {
        Some(p) => Box::new(io::BufWriter::new(fs::File::create(p)?)),
        None => Box::new(io::stdout().lock()),
    })
}

pub fn run_clean(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    symbols: Vec<String>,
) -> Result<(), PipelineError> {
    let config = load_config(config_path)?;
    let out = build_output_config(&config)?;
    let source = open_source(input, &symbols);
    let pipeline = build_pipeline(&config, symbols)?;

    let cleaned = pipeline.clean(source.as_ref())?;

    let mut sink = CsvRowSink::new(open_output(output)?, out.undefined, out.precision);
    sink.write_records(&cleaned.columns, &cleaned.records)?;
    sink.into_inner()?.flush()?;

    info!(
        rows = cleaned.records.len(),
        dropped = cleaned.report.rows_dropped,
        "clean complete"
    );
    Ok(())
}

pub fn run_annotate(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    symbols: Vec<String>,
) -> Result<(), PipelineError> {
    let config = load_config(config_path)?;
    let out = build_output_config(&config)?;
    let source = open_source(input, &symbols);
    let pipeline = build_pipeline(&config, symbols)?;

    let annotated = pipeline.run(source.as_ref())?;

    let mut sink = CsvRowSink::new(open_output(output)?, out.undefined, out.precision);
    sink.write_rows(
        &annotated.columns,
        pipeline.engine().indicators(),
        &annotated.rows,
    )?;
    sink.into_inner()?.flush()?;

    info!(rows = annotated.rows.len(), "annotate complete");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), PipelineError> {
    let config = load_config(Some(config_path))?;
    let engine = build_engine_config(&config)?;
    let cleaner = build_cleaner_config(&config);
    let out = build_output_config(&config)?;

    eprintln!("Date formats:  {}", cleaner.date_formats.join(", "));
    let indicators = IndicatorEngine::new(&engine);
    let names: Vec<String> = indicators
        .indicators()
        .iter()
        .map(|t| format!("{} (lookback {})", t, t.lookback()))
        .collect();
    eprintln!("Indicators:    {}", names.join(", "));
    eprintln!("Undefined as:  {}", out.undefined);
    eprintln!("\nConfiguration is valid.");
    Ok(())
}
