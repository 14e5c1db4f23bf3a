//! Station lists stored as NetCDF.

use std::path::Path;

use reanalysis_common::Station;
use tracing::info;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::open_file;

/// Read stations from a file with `stationid`, `longitude` and `latitude`
/// variables over one station dimension. Numeric ids are converted to text.
pub fn read_stations(path: &Path) -> NetCdfResult<Vec<Station>> {
    let file = open_file(path)?;

    let id_var = file
        .variable("stationid")
        .ok_or_else(|| NetCdfError::missing("stationid", path))?;
    let lon: Vec<f64> = file
        .variable("longitude")
        .ok_or_else(|| NetCdfError::missing("longitude", path))?
        .get_values(..)?;
    let lat: Vec<f64> = file
        .variable("latitude")
        .ok_or_else(|| NetCdfError::missing("latitude", path))?
        .get_values(..)?;

    if lon.len() != lat.len() {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} longitudes but {} latitudes in {}",
            lon.len(),
            lat.len(),
            path.display()
        )));
    }

    let ids: Vec<String> = match id_var.get_values::<f64, _>(..) {
        Ok(numeric) => numeric.into_iter().map(format_numeric_id).collect(),
        Err(_) => (0..lon.len())
            .map(|i| id_var.get_string([i]))
            .collect::<Result<_, _>>()?,
    };

    if ids.len() != lon.len() {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} station ids but {} coordinates in {}",
            ids.len(),
            lon.len(),
            path.display()
        )));
    }

    let stations: Vec<Station> = ids
        .into_iter()
        .zip(lon.into_iter().zip(lat))
        .map(|(id, (lon, lat))| Station::new(id, lon, lat))
        .collect();

    info!(file = %path.display(), count = stations.len(), "Loaded stations");
    Ok(stations)
}

fn format_numeric_id(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_drop_decimals() {
        assert_eq!(format_numeric_id(18700.0), "18700");
        assert_eq!(format_numeric_id(1.5), "1.5");
    }
}
