//! Access to archive files.
//!
//! The assembler only talks to an [`ArchiveReader`], so planning and
//! de-accumulation can be exercised against in-memory archives.

use std::path::Path;

use grid_locator::{CoordinateGrid, GridField, GridIndex};
use netcdf_io::PointSeries;
use reanalysis_common::ExtractResult;

/// Read-only access to archive files. Implementations must be usable from
/// several rayon workers at once.
pub trait ArchiveReader: Send + Sync {
    /// Whether the file exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lon/lat coordinates of the file's grid.
    fn coordinates(&self, path: &Path) -> ExtractResult<CoordinateGrid>;

    /// `variable` at `points` for every time step in the file.
    fn point_series(
        &self,
        path: &Path,
        variable: &str,
        points: &[GridIndex],
    ) -> ExtractResult<PointSeries>;

    /// Full 2-D field of `variable` at `time_index`.
    fn field(&self, path: &Path, variable: &str, time_index: usize) -> ExtractResult<GridField>;
}

/// [`ArchiveReader`] over NetCDF files on a filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfArchiveReader;

impl ArchiveReader for NetCdfArchiveReader {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn coordinates(&self, path: &Path) -> ExtractResult<CoordinateGrid> {
        Ok(netcdf_io::read_coordinate_grid(path)?)
    }

    fn point_series(
        &self,
        path: &Path,
        variable: &str,
        points: &[GridIndex],
    ) -> ExtractResult<PointSeries> {
        Ok(netcdf_io::read_point_series(path, variable, points)?)
    }

    fn field(&self, path: &Path, variable: &str, time_index: usize) -> ExtractResult<GridField> {
        Ok(netcdf_io::read_field(path, variable, time_index)?)
    }
}
