//! Reanalysis point extraction.
//!
//! Extracts hourly station time series from the regional (NORA3) and global
//! (ERA5) reanalysis archives into one NetCDF station archive, stride by
//! stride, and writes request documents for the global retrieval service.

mod batch;
mod stations;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use extraction::{Assembler, ExtractionConfig, NetCdfArchiveReader, RetrievalRequest, SourceSelector};
use netcdf_io::ArchiveWriter;
use reanalysis_common::time::parse_time;
use reanalysis_common::{BoundingBox, TimeRange};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use batch::{BatchJob, BatchRunner};

#[derive(Parser, Debug)]
#[command(name = "extractor")]
#[command(about = "Extract station time series from NORA3 and ERA5 reanalysis archives")]
struct Cli {
    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Log as JSON lines instead of plain text
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract one parameter at a list of stations
    Extract {
        /// Station list (.csv or .nc)
        #[arg(long)]
        input_stations: PathBuf,

        /// Output NetCDF archive, created or appended to
        #[arg(long)]
        output_file: PathBuf,

        /// Parameter name, regional or global
        #[arg(long)]
        parameter: String,

        /// First hour, YYYY-MM-DDTHH:MM
        #[arg(long)]
        start_time: String,

        /// Last hour, YYYY-MM-DDTHH:MM
        #[arg(long)]
        end_time: String,

        /// Extraction config (YAML)
        #[arg(long, env = "EXTRACT_CONFIG")]
        config: Option<PathBuf>,

        /// Calendar exception list replacing the built-in one
        #[arg(long)]
        exceptions: Option<PathBuf>,

        /// Days per stride
        #[arg(long)]
        stride_days: Option<i64>,
    },

    /// Write a global retrieval request as JSON
    Request {
        /// Parameter name in the global archive
        #[arg(long)]
        parameter: String,

        /// Years to request, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        years: Vec<i32>,

        /// Area as west,south,east,north
        #[arg(long, default_value = "4,57,34,81")]
        bbox: String,

        /// Where to write the request document
        #[arg(long)]
        output_file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs)?;
    netcdf_io::silence_hdf5_errors();

    match cli.command {
        Command::Extract {
            input_stations,
            output_file,
            parameter,
            start_time,
            end_time,
            config,
            exceptions,
            stride_days,
        } => {
            let mut config = ExtractionConfig::load(config.as_deref())?;
            if let Some(path) = exceptions {
                config.exceptions_file = Some(path);
            }
            if let Some(days) = stride_days {
                config.stride_days = days;
            }
            config.validate()?;

            let start = parse_time(&start_time).context("Invalid --start-time")?;
            let end = parse_time(&end_time).context("Invalid --end-time")?;
            let range = TimeRange::hourly(start, end)?;
            let stations = stations::load_stations(&input_stations)?;

            let assembler = Assembler::new(NetCdfArchiveReader, config.layout(), config.exceptions()?)
                .with_policy(config.negative_increments);
            let runner = BatchRunner::new(
                assembler,
                SourceSelector::new(config.prefer_atmosphere),
                ArchiveWriter::new(&output_file),
            );

            let job = BatchJob {
                parameter,
                stations,
                range,
                stride_days: config.stride_days,
            };
            let summary = runner.run(&job)?;

            print!("{}", summary);
            if !summary.is_success() {
                bail!(
                    "{} of {} strides failed",
                    summary.failures.len(),
                    summary.strides
                );
            }
            info!(output = %output_file.display(), "Extraction finished");
            Ok(())
        }
        Command::Request {
            parameter,
            years,
            bbox,
            output_file,
        } => {
            let area = BoundingBox::parse(&bbox).with_context(|| format!("Invalid --bbox {}", bbox))?;
            RetrievalRequest::era5_single_levels(&parameter, &years, &area).write_to(&output_file)
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
