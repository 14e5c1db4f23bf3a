//! Station locations.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{ExtractError, ExtractResult};

/// A named point where a time series is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    /// Degrees east.
    pub longitude: f64,
    /// Degrees north.
    pub latitude: f64,
}

impl Station {
    pub fn new(id: impl Into<String>, longitude: f64, latitude: f64) -> Self {
        Self {
            id: id.into(),
            longitude,
            latitude,
        }
    }
}

/// Check that a station list is usable: non-empty with finite coordinates.
pub fn validate_stations(stations: &[Station]) -> ExtractResult<()> {
    if stations.is_empty() {
        return Err(ExtractError::Config("station list is empty".to_string()));
    }
    for station in stations {
        if !station.longitude.is_finite() || !station.latitude.is_finite() {
            return Err(ExtractError::Config(format!(
                "station '{}' has non-finite coordinates ({}, {})",
                station.id, station.longitude, station.latitude
            )));
        }
        if !(-90.0..=90.0).contains(&station.latitude) {
            return Err(ExtractError::out_of_range(format!(
                "station '{}' latitude {} outside [-90, 90]",
                station.id, station.latitude
            )));
        }
    }
    Ok(())
}

/// Bounding box of all stations, `None` for an empty list.
pub fn stations_bbox(stations: &[Station]) -> Option<BoundingBox> {
    BoundingBox::from_points(stations.iter().map(|s| (s.longitude, s.latitude)))
}
