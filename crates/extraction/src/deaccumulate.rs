//! Hourly increments from cycle-accumulated fields.
//!
//! Accumulated variables hold a running sum since the start of their cycle.
//! The increment for hour `t` is `acc(t) - reference(t)`, where the
//! reference comes from a table keyed by hour of day:
//!
//! | hour of day        | reference                                    |
//! |--------------------|----------------------------------------------|
//! | 4, 10, 16, 22      | spinup sample of the same cycle at `t - 1h`  |
//! | any other hour     | previous accumulated sample                  |
//!
//! The boundary hours are the first usable hour of each cycle; all other
//! hours follow a sample from the same cycle.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Timelike, Utc};
use reanalysis_common::{ExtractError, ExtractResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// First usable hour of each cycle (cycle start + spinup).
pub const BOUNDARY_HOURS: [u32; 4] = [4, 10, 16, 22];

pub fn is_boundary_hour(hour: u32) -> bool {
    BOUNDARY_HOURS.contains(&hour)
}

/// Where the reference sample for an hour comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// Index-3 file of the same cycle.
    Spinup,
    /// The previous hourly sample in the series.
    Previous,
}

/// Reference table lookup by hour of day.
pub fn reference_for_hour(hour: u32) -> Reference {
    if is_boundary_hour(hour) {
        Reference::Spinup
    } else {
        Reference::Previous
    }
}

/// What to do with negative increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeIncrementPolicy {
    /// Leave negative values as computed.
    Keep,
    /// Clamp to zero in the first output sample only.
    #[default]
    ClampFirstSample,
    /// Clamp to zero everywhere.
    ClampAll,
}

impl NegativeIncrementPolicy {
    fn applies_to(&self, row: usize) -> bool {
        match self {
            NegativeIncrementPolicy::Keep => false,
            NegativeIncrementPolicy::ClampFirstSample => row == 0,
            NegativeIncrementPolicy::ClampAll => true,
        }
    }
}

/// Accumulated samples of one stride, ready for differencing.
#[derive(Debug, Clone)]
pub struct AccumulatedSeries<'a> {
    /// Hourly valid times, strictly increasing.
    pub times: &'a [DateTime<Utc>],
    /// Time-major `times.len() × n_points`.
    pub values: &'a [f32],
    pub n_points: usize,
    /// Spinup rows keyed by their valid time (boundary hour minus one).
    pub spinup: &'a HashMap<DateTime<Utc>, Vec<f32>>,
    /// The row valid one hour before `times[0]`, if the first hour is not a
    /// boundary hour.
    pub preceding: Option<&'a [f32]>,
}

/// Result of de-accumulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Increments {
    /// Time-major hourly increments, same shape as the input.
    pub values: Vec<f32>,
    /// Number of values clamped to zero.
    pub clamped: usize,
}

/// Turn accumulated samples into hourly increments.
pub fn deaccumulate(
    series: &AccumulatedSeries<'_>,
    policy: NegativeIncrementPolicy,
) -> ExtractResult<Increments> {
    let n = series.n_points;
    let nt = series.times.len();
    if series.values.len() != nt * n {
        return Err(ExtractError::shape_mismatch(
            nt * n,
            series.values.len(),
            "accumulated block",
        ));
    }

    let mut values = Vec::with_capacity(nt * n);
    let mut clamped = 0;

    for (row, t) in series.times.iter().enumerate() {
        let current = &series.values[row * n..(row + 1) * n];
        let reference = reference_row(series, row, *t)?;

        let mut row_clamped = 0;
        for (acc, base) in current.iter().zip(reference) {
            let mut increment = acc - base;
            if increment < 0.0 && policy.applies_to(row) {
                increment = 0.0;
                row_clamped += 1;
            }
            values.push(increment);
        }

        if row_clamped > 0 {
            warn!(
                time = %t,
                points = row_clamped,
                "Clamped negative accumulated increments to zero"
            );
            clamped += row_clamped;
        }
    }

    Ok(Increments { values, clamped })
}

fn reference_row<'a>(
    series: &'a AccumulatedSeries<'_>,
    row: usize,
    t: DateTime<Utc>,
) -> ExtractResult<&'a [f32]> {
    let n = series.n_points;
    let previous = t - Duration::hours(1);

    let found = match reference_for_hour(t.hour()) {
        Reference::Spinup => series.spinup.get(&previous).map(Vec::as_slice),
        Reference::Previous if row > 0 => {
            if series.times[row - 1] != previous {
                return Err(ExtractError::shape_mismatch(
                    1,
                    0,
                    format!("accumulated sample at {} is missing", previous),
                ));
            }
            Some(&series.values[(row - 1) * n..row * n])
        }
        Reference::Previous => series.preceding,
    };

    let found = found.ok_or_else(|| {
        ExtractError::read(format!("no reference sample for accumulated value at {}", t))
    })?;
    if found.len() != n {
        return Err(ExtractError::shape_mismatch(n, found.len(), format!("reference row for {}", t)));
    }
    Ok(found)
}
