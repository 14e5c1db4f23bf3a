//! Synthetic reanalysis fields.
//!
//! Fields are row-major `(height, width)`. Accumulations follow the
//! regional cycle structure: a running sum from the cycle start.

use chrono::{DateTime, Duration, Utc};

/// Field whose value names its cell: `col * 1000 + row`.
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    (0..height)
        .flat_map(|row| (0..width).map(move |col| (col * 1000 + row) as f32))
        .collect()
}

/// Creates 2-D longitude and latitude fields for a grid with uniform spacing.
///
/// Row `r`, column `c` sits at `(lon0 + c * dlon, lat0 + r * dlat)`.
/// Both fields are row-major with `height` rows of `width` values.
pub fn create_lonlat_fields(
    width: usize,
    height: usize,
    lon0: f64,
    lat0: f64,
    dlon: f64,
    dlat: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut lon = Vec::with_capacity(width * height);
    let mut lat = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            lon.push(lon0 + col as f64 * dlon);
            lat.push(lat0 + row as f64 * dlat);
        }
    }
    (lon, lat)
}

/// Creates lon/lat fields for a sheared grid, as seen on projected
/// (e.g. Lambert) domains where longitude drifts with latitude.
pub fn create_sheared_lonlat_fields(
    width: usize,
    height: usize,
    lon0: f64,
    lat0: f64,
    step: f64,
    shear: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut lon = Vec::with_capacity(width * height);
    let mut lat = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            lon.push(lon0 + col as f64 * step + row as f64 * shear);
            lat.push(lat0 + row as f64 * step);
        }
    }
    (lon, lat)
}

/// Creates a wave-like field that is `missing` on land.
///
/// Columns below `coast_col` are land; the rest hold `1.0 + col`.
pub fn create_coastal_grid(width: usize, height: usize, coast_col: usize, missing: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(if col < coast_col { missing } else { 1.0 + col as f32 });
        }
    }
    data
}

/// Every cell set to `value`, e.g. an all-land wave field.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Zero field with NaN at each `(col, row)` listed; positions off the grid
/// are ignored.
pub fn create_grid_with_nans(width: usize, height: usize, nans: &[(usize, usize)]) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nans.iter().filter(|(c, r)| *c < width && *r < height) {
        data[row * width + col] = f32::NAN;
    }
    data
}

/// Known one-hour increment for the hour ending at `t`.
///
/// Deterministic and strictly positive, cycling through 0.5..=3.5 so that
/// consecutive hours always differ.
pub fn synthetic_hourly_increment(t: DateTime<Utc>) -> f32 {
    let hours = t.timestamp().div_euclid(3600);
    (hours.rem_euclid(7) + 1) as f32 * 0.5
}

/// Running sum of [`synthetic_hourly_increment`] from `cycle_start`
/// (exclusive) up to `valid` (inclusive), as stored in an accumulated field.
pub fn synthetic_accumulation(cycle_start: DateTime<Utc>, valid: DateTime<Utc>) -> f32 {
    let mut total = 0.0f32;
    let mut t = cycle_start + Duration::hours(1);
    while t <= valid {
        total += synthetic_hourly_increment(t);
        t += Duration::hours(1);
    }
    total
}

/// Simple instantaneous signal: whole hours elapsed since `base`, so
/// consecutive hours differ by exactly 1.
pub fn synthetic_hour_signal(t: DateTime<Utc>, base: DateTime<Utc>) -> f32 {
    (t - base).num_hours() as f32
}
