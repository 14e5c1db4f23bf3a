//! Append-friendly station time-series archive.
//!
//! One NetCDF-4 file with an unlimited `time` dimension and a fixed `station`
//! dimension. The first write creates the file; later writes append along
//! `time` after checking the file still describes the same stations and
//! variables.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use reanalysis_common::Station;
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{decode_times, encode_hours_since, open_file, silence_hdf5_errors};

/// Fill value written for missing samples.
pub const FILL_VALUE: f32 = 1.0e37;

/// Units of the archive time axis.
pub const TIME_UNITS: &str = "hours since 1970-01-01 00:00:00";

const COORDINATE_VARIABLES: [&str; 6] = [
    "time",
    "stationid",
    "longitude",
    "latitude",
    "longitude_station",
    "latitude_station",
];

/// Global attributes of the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveMetadata {
    pub conventions: String,
    pub reference: String,
    pub summary: String,
    pub project: String,
    pub institute: String,
    pub creator_url: String,
    pub contact: String,
}

impl Default for ArchiveMetadata {
    fn default() -> Self {
        Self {
            conventions: "CF-1.8".to_string(),
            reference: "https://thredds.met.no/thredds/projects/nora3.html".to_string(),
            summary: "Timeseries extracted from NORA3 3-km Norwegian Reanalysis".to_string(),
            project: "NORA3 and SUNPOINT".to_string(),
            institute: "Norwegian Meteorological Institute".to_string(),
            creator_url: "https://www.met.no".to_string(),
            contact: "martinls@met.no".to_string(),
        }
    }
}

/// One data variable of a block, time-major `(time × station)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockVariable {
    pub name: String,
    pub values: Vec<f32>,
    pub units: Option<String>,
}

/// A contiguous span of time for all stations.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveBlock {
    pub times: Vec<DateTime<Utc>>,
    pub stations: Vec<Station>,
    /// `(lon, lat)` of the grid point used for each station.
    pub grid_points: Vec<(f64, f64)>,
    pub variables: Vec<BlockVariable>,
}

impl ArchiveBlock {
    fn validate(&self) -> NetCdfResult<()> {
        let n_stations = self.stations.len();
        if n_stations == 0 {
            return Err(NetCdfError::InvalidFormat("block has no stations".to_string()));
        }
        if self.grid_points.len() != n_stations {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} grid points for {} stations",
                self.grid_points.len(),
                n_stations
            )));
        }
        for pair in self.times.windows(2) {
            if pair[1] <= pair[0] {
                return Err(NetCdfError::InvalidFormat(format!(
                    "block times not increasing at {}",
                    pair[1]
                )));
            }
        }
        for var in &self.variables {
            if var.values.len() != self.times.len() * n_stations {
                return Err(NetCdfError::InvalidFormat(format!(
                    "variable {} has {} values, expected {} x {}",
                    var.name,
                    var.values.len(),
                    self.times.len(),
                    n_stations
                )));
            }
        }
        Ok(())
    }

    fn variable_names(&self) -> BTreeSet<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }
}

/// What a write did to the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Appended { offset: usize },
}

/// Writes [`ArchiveBlock`]s to a single archive file.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    path: PathBuf,
    metadata: ArchiveMetadata,
}

impl ArchiveWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata: ArchiveMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ArchiveMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the archive on first use, append otherwise.
    ///
    /// Schema mismatches are reported as such; any other failure while
    /// creating or extending the file is a [`NetCdfError::WriteFailed`].
    pub fn write(&self, block: &ArchiveBlock) -> NetCdfResult<WriteOutcome> {
        silence_hdf5_errors();
        block.validate()?;

        let outcome = if self.path.exists() {
            self.append(block)
                .map(|offset| WriteOutcome::Appended { offset })
        } else {
            self.create(block).map(|()| WriteOutcome::Created)
        };
        outcome.map_err(|err| match err {
            NetCdfError::SchemaMismatch { .. } | NetCdfError::WriteFailed { .. } => err,
            other => NetCdfError::write_failed(&self.path, other.to_string()),
        })
    }

    fn create(&self, block: &ArchiveBlock) -> NetCdfResult<()> {
        let n_stations = block.stations.len();
        let mut file = netcdf::create(&self.path)?;

        file.add_unlimited_dimension("time")?;
        file.add_dimension("station", n_stations)?;

        {
            let mut var = file.add_variable::<f64>("time", &["time"])?;
            var.put_attribute("standard_name", "time")?;
            var.put_attribute("long_name", "time")?;
            var.put_attribute("units", TIME_UNITS)?;
            var.put_attribute("calendar", "standard")?;
        }

        {
            let mut var = file.add_string_variable("stationid", &["station"])?;
            var.put_attribute("long_name", "station identifier")?;
            for (i, station) in block.stations.iter().enumerate() {
                var.put_string(&station.id, [i])?;
            }
        }

        let grid_lon: Vec<f64> = block.grid_points.iter().map(|p| p.0).collect();
        let grid_lat: Vec<f64> = block.grid_points.iter().map(|p| p.1).collect();
        let station_lon: Vec<f64> = block.stations.iter().map(|s| s.longitude).collect();
        let station_lat: Vec<f64> = block.stations.iter().map(|s| s.latitude).collect();

        {
            let mut var = file.add_variable::<f64>("longitude", &["station"])?;
            var.put_attribute("units", "degrees_east")?;
            var.put_attribute("long_name", "longitude")?;
            var.put_attribute("description", "longitude of closest data point to station")?;
            var.put_values(&grid_lon, ..)?;
        }
        {
            let mut var = file.add_variable::<f64>("latitude", &["station"])?;
            var.put_attribute("units", "degrees_north")?;
            var.put_attribute("long_name", "latitude")?;
            var.put_attribute("description", "latitude of closest data point to station")?;
            var.put_values(&grid_lat, ..)?;
        }
        {
            let mut var = file.add_variable::<f64>("longitude_station", &["station"])?;
            var.put_attribute("units", "degrees_east")?;
            var.put_attribute("long_name", "longitude of station")?;
            var.put_values(&station_lon, ..)?;
        }
        {
            let mut var = file.add_variable::<f64>("latitude_station", &["station"])?;
            var.put_attribute("units", "degrees_north")?;
            var.put_attribute("long_name", "latitude of station")?;
            var.put_values(&station_lat, ..)?;
        }

        for data in &block.variables {
            let mut var = file.add_variable::<f32>(&data.name, &["time", "station"])?;
            var.put_attribute("_FillValue", FILL_VALUE)?;
            var.put_attribute("coordinates", "longitude latitude")?;
            if let Some(units) = &data.units {
                var.put_attribute("units", units.as_str())?;
            }
        }

        file.add_attribute("Conventions", self.metadata.conventions.as_str())?;
        file.add_attribute("reference", self.metadata.reference.as_str())?;
        file.add_attribute("summary", self.metadata.summary.as_str())?;
        file.add_attribute("project", self.metadata.project.as_str())?;
        file.add_attribute("institute", self.metadata.institute.as_str())?;
        file.add_attribute("creator_url", self.metadata.creator_url.as_str())?;
        file.add_attribute("contact", self.metadata.contact.as_str())?;

        write_rows(&mut file, block, 0)?;

        info!(
            file = %self.path.display(),
            stations = n_stations,
            times = block.times.len(),
            "Created archive"
        );
        Ok(())
    }

    fn append(&self, block: &ArchiveBlock) -> NetCdfResult<usize> {
        let mut file = netcdf::append(&self.path)?;

        let n_stations = file
            .dimension("station")
            .ok_or_else(|| NetCdfError::missing("station", &self.path))?
            .len();
        if n_stations != block.stations.len() {
            return Err(NetCdfError::schema_mismatch(
                &self.path,
                format!(
                    "archive has {} stations, block has {}",
                    n_stations,
                    block.stations.len()
                ),
            ));
        }

        let stored_ids = {
            let id_var = file
                .variable("stationid")
                .ok_or_else(|| NetCdfError::missing("stationid", &self.path))?;
            (0..n_stations)
                .map(|i| id_var.get_string([i]))
                .collect::<Result<Vec<_>, _>>()?
        };
        let renamed = stored_ids
            .iter()
            .zip(&block.stations)
            .position(|(stored, station)| *stored != station.id);
        if let Some(i) = renamed {
            return Err(NetCdfError::schema_mismatch(
                &self.path,
                format!(
                    "station {} is {} in the archive but {} in the block",
                    i, stored_ids[i], block.stations[i].id
                ),
            ));
        }

        let existing_vars: BTreeSet<String> = file
            .variables()
            .map(|v| v.name())
            .filter(|name| !COORDINATE_VARIABLES.contains(&name.as_str()))
            .collect();
        let block_vars = block.variable_names();
        if existing_vars != block_vars {
            return Err(NetCdfError::schema_mismatch(
                &self.path,
                format!(
                    "archive variables {:?} differ from block variables {:?}",
                    existing_vars, block_vars
                ),
            ));
        }

        let offset = file
            .dimension("time")
            .ok_or_else(|| NetCdfError::missing("time", &self.path))?
            .len();

        if offset > 0 {
            let time_var = file
                .variable("time")
                .ok_or_else(|| NetCdfError::missing("time", &self.path))?;
            let last: Vec<f64> = time_var.get_values(offset - 1..offset)?;
            let last = decode_times(&last, TIME_UNITS).map_err(|e| {
                NetCdfError::schema_mismatch(&self.path, format!("unreadable time axis: {}", e))
            })?;
            if let (Some(last), Some(first_new)) = (last.first(), block.times.first()) {
                if first_new <= last {
                    return Err(NetCdfError::schema_mismatch(
                        &self.path,
                        format!(
                            "appended times start at {} but archive already ends at {}",
                            first_new, last
                        ),
                    ));
                }
            }
        }

        write_rows(&mut file, block, offset)?;

        debug!(
            file = %self.path.display(),
            offset = offset,
            times = block.times.len(),
            "Appended to archive"
        );
        Ok(offset)
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

fn write_rows(file: &mut netcdf::FileMut, block: &ArchiveBlock, offset: usize) -> NetCdfResult<()> {
    let n = block.times.len();
    if n == 0 {
        return Ok(());
    }
    let end = offset + n;

    {
        let hours = encode_hours_since(&block.times, epoch());
        let mut var = file
            .variable_mut("time")
            .ok_or_else(|| NetCdfError::InvalidFormat("time variable vanished".to_string()))?;
        var.put_values(&hours, offset..end)?;
    }

    for data in &block.variables {
        let values: Vec<f32> = data
            .values
            .iter()
            .map(|&v| if v.is_nan() { FILL_VALUE } else { v })
            .collect();
        let mut var = file.variable_mut(&data.name).ok_or_else(|| {
            NetCdfError::InvalidFormat(format!("variable {} vanished", data.name))
        })?;
        var.put_values(&values, (offset..end, ..))?;
    }

    Ok(())
}

/// Full contents of an archive, for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveContents {
    pub times: Vec<DateTime<Utc>>,
    pub station_ids: Vec<String>,
    pub grid_points: Vec<(f64, f64)>,
    /// `(name, time-major values)`, fill values decoded to NaN.
    pub variables: Vec<(String, Vec<f32>)>,
}

/// Read an archive back.
pub fn read_archive(path: &Path) -> NetCdfResult<ArchiveContents> {
    let file = open_file(path)?;

    let time_var = file
        .variable("time")
        .ok_or_else(|| NetCdfError::missing("time", path))?;
    let hours: Vec<f64> = time_var.get_values(..)?;
    let times = decode_times(&hours, TIME_UNITS)?;

    let n_stations = file
        .dimension("station")
        .ok_or_else(|| NetCdfError::missing("station", path))?
        .len();
    let id_var = file
        .variable("stationid")
        .ok_or_else(|| NetCdfError::missing("stationid", path))?;
    let station_ids = (0..n_stations)
        .map(|i| id_var.get_string([i]))
        .collect::<Result<Vec<_>, _>>()?;

    let lon: Vec<f64> = file
        .variable("longitude")
        .ok_or_else(|| NetCdfError::missing("longitude", path))?
        .get_values(..)?;
    let lat: Vec<f64> = file
        .variable("latitude")
        .ok_or_else(|| NetCdfError::missing("latitude", path))?
        .get_values(..)?;

    let mut variables = Vec::new();
    for var in file.variables() {
        let name = var.name();
        if COORDINATE_VARIABLES.contains(&name.as_str()) {
            continue;
        }
        let values: Vec<f32> = var.get_values(..)?;
        let values = values
            .into_iter()
            .map(|v| if v == FILL_VALUE { f32::NAN } else { v })
            .collect();
        variables.push((name, values));
    }

    Ok(ArchiveContents {
        times,
        station_ids,
        grid_points: lon.into_iter().zip(lat).collect(),
        variables,
    })
}
