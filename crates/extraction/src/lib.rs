//! Point time-series extraction from reanalysis archives.
//!
//! Provides the logic that turns a (parameter, stations, time range) request
//! into an hourly series block.
//!
//! # Architecture
//!
//! - Archive selection with up-front validation ([`SourceSelector`])
//! - Forecast-cycle file location, spinup and first-timestep rules ([`cycle`])
//! - Calendar exceptions for known archive defects ([`ExceptionList`])
//! - De-accumulation of cycle running sums ([`deaccumulate()`])
//! - Assembly over an [`ArchiveReader`], with per-file reads on rayon ([`Assembler`])
//! - Request documents for the global retrieval service ([`RetrievalRequest`])

pub mod assembler;
pub mod config;
pub mod cycle;
pub mod deaccumulate;
pub mod exceptions;
pub mod layout;
pub mod reader;
pub mod retrieval;
pub mod source;

// Re-exports
pub use assembler::{Assembler, Extraction, ExtractionReport, SeriesBlock};
pub use config::ExtractionConfig;
pub use cycle::{locate, plan_files, CycleFile, FilePlan, FileStream};
pub use deaccumulate::{deaccumulate, NegativeIncrementPolicy};
pub use exceptions::{CalendarException, ExceptionList, ExceptionPolicy};
pub use layout::ArchiveLayout;
pub use reader::{ArchiveReader, NetCdfArchiveReader};
pub use retrieval::RetrievalRequest;
pub use source::{SourceSelection, SourceSelector};
