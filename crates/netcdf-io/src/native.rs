//! Low-level helpers around the netcdf library.
//!
//! Opening files, reading attributes without HDF5 error spam, and decoding
//! CF time axes.

use std::path::Path;
use std::sync::Once;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{NetCdfError, NetCdfResult};

/// Turn off the HDF5 library's automatic error stack printing.
///
/// Probing for optional attributes (`scale_factor`, `_FillValue`, ...) makes
/// HDF5 print `HDF5-DIAG` traces to stderr although the error is handled.
/// Runs once per process; later calls do nothing.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: a null handler and client pointer switch automatic printing off.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Open a NetCDF file for reading, returning [`NetCdfError::FileNotFound`]
/// if the path does not exist.
pub fn open_file(path: &Path) -> NetCdfResult<netcdf::File> {
    silence_hdf5_errors();

    if !path.exists() {
        return Err(NetCdfError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
pub(crate) fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get a numeric attribute as f64.
pub(crate) fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get a string attribute.
pub(crate) fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    String::try_from(attr_value).ok()
}

/// Packing and missing-value attributes of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
}

impl Packing {
    pub fn of(var: &netcdf::Variable) -> Self {
        Self {
            scale_factor: get_f64_attr(var, "scale_factor").unwrap_or(1.0),
            add_offset: get_f64_attr(var, "add_offset").unwrap_or(0.0),
            fill_value: get_f64_attr(var, "_FillValue"),
            missing_value: get_f64_attr(var, "missing_value"),
        }
    }

    /// Unpack one raw value; fill and missing values become NaN.
    pub fn unpack(&self, raw: f32) -> f32 {
        let is_missing = |m: Option<f64>| m.map_or(false, |m| raw == m as f32);
        if raw.is_nan() || is_missing(self.fill_value) || is_missing(self.missing_value) {
            return f32::NAN;
        }
        if self.scale_factor == 1.0 && self.add_offset == 0.0 {
            return raw;
        }
        (raw as f64 * self.scale_factor + self.add_offset) as f32
    }
}

/// Parse CF time units of the form `"<unit> since <reference>"`.
///
/// Returns the length of one unit in seconds and the reference instant (UTC).
pub fn parse_time_units(units: &str) -> NetCdfResult<(f64, DateTime<Utc>)> {
    let (unit, reference) = units
        .split_once(" since ")
        .ok_or_else(|| NetCdfError::InvalidTime(format!("unexpected time units '{}'", units)))?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
        "minutes" | "minute" | "mins" | "min" => 60.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3600.0,
        "days" | "day" | "d" => 86400.0,
        other => {
            return Err(NetCdfError::InvalidTime(format!(
                "unsupported time unit '{}' in '{}'",
                other, units
            )))
        }
    };

    let reference = reference
        .trim()
        .trim_end_matches("+00:00")
        .trim()
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim();

    let parsed = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(reference, fmt).ok())
    .or_else(|| {
        NaiveDate::parse_from_str(reference, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
    .ok_or_else(|| {
        NetCdfError::InvalidTime(format!("cannot parse reference time '{}'", reference))
    })?;

    Ok((seconds_per_unit, Utc.from_utc_datetime(&parsed)))
}

/// Convert numeric offsets to instants, rounded to the nearest second.
pub fn decode_times(values: &[f64], units: &str) -> NetCdfResult<Vec<DateTime<Utc>>> {
    let (seconds_per_unit, reference) = parse_time_units(units)?;
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return Err(NetCdfError::InvalidTime(format!("non-finite time value {}", v)));
            }
            Ok(reference + Duration::seconds((v * seconds_per_unit).round() as i64))
        })
        .collect()
}

/// Encode instants as fractional hours since `reference`.
pub fn encode_hours_since(times: &[DateTime<Utc>], reference: DateTime<Utc>) -> Vec<f64> {
    times
        .iter()
        .map(|t| (*t - reference).num_seconds() as f64 / 3600.0)
        .collect()
}
