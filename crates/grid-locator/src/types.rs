//! Core types for grid location.

use crate::error::{GridLocatorError, Result};
use crate::nearest::{nearest_curvilinear, nearest_on_axis, wrap_longitude};

/// A cell on a 2-D grid, row (`y`) then column (`x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridIndex {
    pub y: usize,
    pub x: usize,
}

impl GridIndex {
    pub fn new(y: usize, x: usize) -> Self {
        Self { y, x }
    }

    /// Flat row-major offset for a grid `nx` columns wide.
    pub fn flat(&self, nx: usize) -> usize {
        self.y * nx + self.x
    }

    /// Inverse of [`GridIndex::flat`].
    pub fn from_flat(flat: usize, nx: usize) -> Self {
        Self {
            y: flat / nx,
            x: flat % nx,
        }
    }
}

impl std::fmt::Display for GridIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(y={}, x={})", self.y, self.x)
    }
}

/// Longitude and latitude of every grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateGrid {
    /// 2-D lon/lat fields, row-major `(ny, nx)`. Used by projected grids.
    Curvilinear {
        lon: Vec<f64>,
        lat: Vec<f64>,
        ny: usize,
        nx: usize,
    },
    /// 1-D axes of a regular lat/lon grid; `lat` indexes rows, `lon` columns.
    Regular { lon: Vec<f64>, lat: Vec<f64> },
}

impl CoordinateGrid {
    /// Build a curvilinear grid, checking both fields hold `ny * nx` values.
    pub fn curvilinear(lon: Vec<f64>, lat: Vec<f64>, ny: usize, nx: usize) -> Result<Self> {
        let expected = ny * nx;
        if lon.len() != expected {
            return Err(GridLocatorError::shape_mismatch(expected, lon.len(), "longitude"));
        }
        if lat.len() != expected {
            return Err(GridLocatorError::shape_mismatch(expected, lat.len(), "latitude"));
        }
        Ok(Self::Curvilinear { lon, lat, ny, nx })
    }

    pub fn regular(lon: Vec<f64>, lat: Vec<f64>) -> Self {
        Self::Regular { lon, lat }
    }

    /// Grid shape as `(ny, nx)`.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            CoordinateGrid::Curvilinear { ny, nx, .. } => (*ny, *nx),
            CoordinateGrid::Regular { lon, lat } => (lat.len(), lon.len()),
        }
    }

    /// Nearest cell to `(lon, lat)` given in the grid's own coordinate system.
    pub fn nearest(&self, lon: f64, lat: f64) -> Result<GridIndex> {
        match self {
            CoordinateGrid::Curvilinear {
                lon: grid_lon,
                lat: grid_lat,
                nx,
                ..
            } => nearest_curvilinear(grid_lon, grid_lat, lon, lat)
                .map(|flat| GridIndex::from_flat(flat, *nx))
                .ok_or_else(|| GridLocatorError::empty_grid("curvilinear lon/lat fields")),
            CoordinateGrid::Regular {
                lon: lon_axis,
                lat: lat_axis,
            } => {
                let x = nearest_on_axis(lon_axis, wrap_longitude(lon, lon_axis))
                    .ok_or_else(|| GridLocatorError::empty_grid("longitude axis"))?;
                let y = nearest_on_axis(lat_axis, lat)
                    .ok_or_else(|| GridLocatorError::empty_grid("latitude axis"))?;
                Ok(GridIndex::new(y, x))
            }
        }
    }

    /// Longitude and latitude of a cell.
    pub fn coordinates_at(&self, index: GridIndex) -> (f64, f64) {
        match self {
            CoordinateGrid::Curvilinear { lon, lat, nx, .. } => {
                let flat = index.flat(*nx);
                (lon[flat], lat[flat])
            }
            CoordinateGrid::Regular { lon, lat } => (lon[index.x], lat[index.y]),
        }
    }
}

/// One 2-D slice of a variable, row-major `(ny, nx)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridField {
    pub data: Vec<f32>,
    pub ny: usize,
    pub nx: usize,
}

impl GridField {
    pub fn new(data: Vec<f32>, ny: usize, nx: usize) -> Result<Self> {
        if data.len() != ny * nx {
            return Err(GridLocatorError::shape_mismatch(ny * nx, data.len(), "grid field"));
        }
        Ok(Self { data, ny, nx })
    }

    /// Value at a cell, `None` outside the grid.
    pub fn get(&self, index: GridIndex) -> Option<f32> {
        if index.y >= self.ny || index.x >= self.nx {
            return None;
        }
        self.data.get(index.flat(self.nx)).copied()
    }
}
