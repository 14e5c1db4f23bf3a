//! Reading coordinates, time axes and point series from archive files.

use std::path::Path;

use chrono::{DateTime, Utc};
use grid_locator::{CoordinateGrid, GridField, GridIndex};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{decode_times, get_string_attr, open_file, Packing};

const LON_NAMES: [&str; 2] = ["longitude", "lon"];
const LAT_NAMES: [&str; 2] = ["latitude", "lat"];

/// Values of one variable at a set of grid points, for every time step in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSeries {
    pub times: Vec<DateTime<Utc>>,
    /// Time-major, `times.len() × n_points`.
    pub values: Vec<f32>,
    pub n_points: usize,
}

impl PointSeries {
    /// Values of all points at time step `t`.
    pub fn row(&self, t: usize) -> &[f32] {
        &self.values[t * self.n_points..(t + 1) * self.n_points]
    }
}

/// Decode the `time` variable of an open file.
pub fn read_time_axis(file: &netcdf::File, path: &Path) -> NetCdfResult<Vec<DateTime<Utc>>> {
    let var = file
        .variable("time")
        .ok_or_else(|| NetCdfError::missing("time", path))?;
    let units = get_string_attr(&var, "units")
        .ok_or_else(|| NetCdfError::missing("time:units", path))?;
    let values: Vec<f64> = var.get_values(..)?;
    decode_times(&values, &units)
}

/// Read the lon/lat coordinates of a file.
///
/// 2-D coordinate variables give a curvilinear grid; 1-D variables give a
/// regular grid.
pub fn read_coordinate_grid(path: &Path) -> NetCdfResult<CoordinateGrid> {
    let file = open_file(path)?;

    let lon_var = find_variable(&file, &LON_NAMES, path)?;
    let lat_var = find_variable(&file, &LAT_NAMES, path)?;

    let lon: Vec<f64> = lon_var.get_values(..)?;
    let lat: Vec<f64> = lat_var.get_values(..)?;

    let dims = lon_var.dimensions();
    match dims.len() {
        1 => Ok(CoordinateGrid::regular(lon, lat)),
        2 => {
            let (ny, nx) = (dims[0].len(), dims[1].len());
            CoordinateGrid::curvilinear(lon, lat, ny, nx)
                .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))
        }
        n => Err(NetCdfError::InvalidFormat(format!(
            "longitude in {} has {} dimensions",
            path.display(),
            n
        ))),
    }
}

/// Whether `var_name` exists in the file.
pub fn has_variable(path: &Path, var_name: &str) -> NetCdfResult<bool> {
    let file = open_file(path)?;
    let found = file.variable(var_name).is_some();
    Ok(found)
}

/// Read `var_name` at each grid point for every time step of the file.
///
/// The last two dimensions are taken as `(y, x)`. A leading `time` dimension
/// is read in full; any other leading dimension (e.g. a height level) is read
/// at index 0.
pub fn read_point_series(path: &Path, var_name: &str, points: &[GridIndex]) -> NetCdfResult<PointSeries> {
    let file = open_file(path)?;
    let times = read_time_axis(&file, path)?;

    let var = file
        .variable(var_name)
        .ok_or_else(|| NetCdfError::missing(var_name, path))?;
    let packing = Packing::of(&var);

    let dims = var.dimensions();
    let rank = dims.len();
    if rank < 2 {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} in {} has {} dimensions, expected at least 2",
            var_name,
            path.display(),
            rank
        )));
    }
    let (ny, nx) = (dims[rank - 2].len(), dims[rank - 1].len());
    let has_time = rank > 2 && dims[0].name() == "time";
    let nt = if has_time { dims[0].len() } else { 1 };

    if nt != times.len() {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} in {} has {} time steps but the time axis has {}",
            var_name,
            path.display(),
            nt,
            times.len()
        )));
    }

    let n_points = points.len();
    let mut values = vec![f32::NAN; nt * n_points];

    for (p, point) in points.iter().enumerate() {
        if point.y >= ny || point.x >= nx {
            return Err(NetCdfError::InvalidFormat(format!(
                "grid point {} outside {}x{} grid of {}",
                point, ny, nx, var_name
            )));
        }
        let (y, x) = (point.y..point.y + 1, point.x..point.x + 1);
        let t = 0..nt;

        let raw: Vec<f32> = match rank {
            2 => var.get_values((y, x))?,
            3 => var.get_values((t, y, x))?,
            4 => var.get_values((t, 0..1, y, x))?,
            n => {
                return Err(NetCdfError::InvalidFormat(format!(
                    "{} has unsupported rank {}",
                    var_name, n
                )))
            }
        };

        for (ti, v) in raw.into_iter().enumerate().take(nt) {
            values[ti * n_points + p] = packing.unpack(v);
        }
    }

    debug!(
        file = %path.display(),
        variable = var_name,
        times = nt,
        points = n_points,
        "Read point series"
    );

    Ok(PointSeries {
        times,
        values,
        n_points,
    })
}

/// Read the full 2-D field of `var_name` at time step `time_index`.
pub fn read_field(path: &Path, var_name: &str, time_index: usize) -> NetCdfResult<GridField> {
    let file = open_file(path)?;
    let var = file
        .variable(var_name)
        .ok_or_else(|| NetCdfError::missing(var_name, path))?;
    let packing = Packing::of(&var);

    let dims = var.dimensions();
    let rank = dims.len();
    if rank < 2 {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} has {} dimensions, expected at least 2",
            var_name, rank
        )));
    }
    let (ny, nx) = (dims[rank - 2].len(), dims[rank - 1].len());
    let t = time_index..time_index + 1;

    let raw: Vec<f32> = match rank {
        2 => var.get_values((0..ny, 0..nx))?,
        3 => var.get_values((t, 0..ny, 0..nx))?,
        4 => var.get_values((t, 0..1, 0..ny, 0..nx))?,
        n => {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has unsupported rank {}",
                var_name, n
            )))
        }
    };

    let data = raw.into_iter().map(|v| packing.unpack(v)).collect();
    GridField::new(data, ny, nx).map_err(|e| NetCdfError::InvalidFormat(e.to_string()))
}

fn find_variable<'f>(
    file: &'f netcdf::File,
    names: &[&str],
    path: &Path,
) -> NetCdfResult<netcdf::Variable<'f>> {
    names
        .iter()
        .find_map(|name| file.variable(name))
        .ok_or_else(|| NetCdfError::missing(names.join("|"), path))
}
