//! Station list loading.
//!
//! CSV lists carry a header row and the columns `index, station_id,
//! latitude, longitude`, read by position so header spelling does not
//! matter. Anything ending in `.nc` is read as a NetCDF station file.

use std::path::Path;

use anyhow::{Context, Result};
use reanalysis_common::station::validate_stations;
use reanalysis_common::Station;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct StationRecord {
    #[allow(dead_code)]
    index: String,
    station_id: String,
    latitude: f64,
    longitude: f64,
}

impl From<StationRecord> for Station {
    fn from(record: StationRecord) -> Self {
        Station::new(record.station_id, record.longitude, record.latitude)
    }
}

/// Load and validate a station list.
pub fn load_stations(path: &Path) -> Result<Vec<Station>> {
    let is_netcdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("nc"))
        .unwrap_or(false);

    let stations = if is_netcdf {
        netcdf_io::read_stations(path)
            .with_context(|| format!("Failed to read station file {}", path.display()))?
    } else {
        read_csv_stations(path)?
    };

    validate_stations(&stations)
        .with_context(|| format!("Invalid station list {}", path.display()))?;
    Ok(stations)
}

fn read_csv_stations(path: &Path) -> Result<Vec<Station>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open station list {}", path.display()))?;

    let mut stations = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read line {} of {}", line + 2, path.display()))?;
        let station: StationRecord = record.deserialize(None).with_context(|| {
            format!("Malformed station on line {} of {}", line + 2, path.display())
        })?;
        stations.push(station.into());
    }

    info!(file = %path.display(), count = stations.len(), "Loaded stations");
    Ok(stations)
}
