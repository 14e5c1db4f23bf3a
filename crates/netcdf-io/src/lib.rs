//! NetCDF input and output for reanalysis point extraction.
//!
//! Reading side: coordinates, CF time axes and per-point series from the
//! regional cycle files and global monthly files, with `scale_factor`,
//! `add_offset` and fill values applied. Writing side: the station
//! time-series archive with create-or-append semantics.
//!
//! All entry points call [`silence_hdf5_errors`] before touching HDF5.

pub mod archive;
pub mod error;
pub mod native;
pub mod reader;
pub mod stations;

pub use archive::{
    read_archive, ArchiveBlock, ArchiveContents, ArchiveMetadata, ArchiveWriter, BlockVariable,
    WriteOutcome, FILL_VALUE, TIME_UNITS,
};
pub use error::{NetCdfError, NetCdfResult};
pub use native::{decode_times, open_file, parse_time_units, silence_hdf5_errors};
pub use reader::{has_variable, read_coordinate_grid, read_field, read_point_series, PointSeries};
pub use stations::read_stations;
