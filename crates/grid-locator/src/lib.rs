//! Grid point location for station time series.
//!
//! This crate maps station coordinates onto model grids and reshapes point
//! series in time:
//!
//! - **Nearest point**: minimum Chebyshev distance on curvilinear lon/lat
//!   fields, or per-axis nearest on regular lat/lon grids
//! - **Wet point**: breadth-first search for the nearest non-missing cell
//! - **Resampling**: linear interpolation of coarse series onto hourly times
//!
//! # Architecture
//!
//! ```text
//! Station (lon, lat)
//!      │
//!      ▼
//! CoordinateGrid::nearest()
//!      │
//!      ├─► Curvilinear: argmin max(|Δlon|, |Δlat|), first in row-major order
//!      │
//!      └─► Regular: wrap longitude, nearest per axis
//!               │
//!               ▼
//!          GridIndex (y, x) ──► nearest_wet_point() if the cell is missing
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_locator::{CoordinateGrid, GridIndex};
//!
//! let grid = CoordinateGrid::curvilinear(lon, lat, ny, nx)?;
//! let index = grid.nearest(10.72, 59.94)?;
//! let (lon, lat) = grid.coordinates_at(index);
//! ```

pub mod error;
pub mod nearest;
pub mod resample;
pub mod types;
pub mod wet_point;

pub use error::{GridLocatorError, Result};
pub use nearest::{nearest_curvilinear, nearest_on_axis, wrap_longitude};
pub use resample::{interpolate_block, interpolate_series};
pub use types::{CoordinateGrid, GridField, GridIndex};
pub use wet_point::nearest_wet_point;
