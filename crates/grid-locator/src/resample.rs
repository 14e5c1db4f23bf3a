//! Linear interpolation of point series onto a finer time axis.

use chrono::{DateTime, Utc};

use crate::error::{GridLocatorError, Result};

/// Interpolate one series sampled at `times` onto `targets`.
///
/// `times` must be strictly increasing and every target must lie within
/// `[times[0], times[last]]`. Targets equal to a sample time return that
/// sample unchanged. NaN samples propagate to the targets they bracket.
pub fn interpolate_series(
    times: &[DateTime<Utc>],
    values: &[f32],
    targets: &[DateTime<Utc>],
) -> Result<Vec<f32>> {
    interpolate_block(times, values, 1, targets)
}

/// Interpolate a time-major block `(times.len() × n_series)` onto `targets`,
/// returning a `(targets.len() × n_series)` block.
pub fn interpolate_block(
    times: &[DateTime<Utc>],
    block: &[f32],
    n_series: usize,
    targets: &[DateTime<Utc>],
) -> Result<Vec<f32>> {
    if block.len() != times.len() * n_series {
        return Err(GridLocatorError::shape_mismatch(
            times.len() * n_series,
            block.len(),
            "resample source block",
        ));
    }
    check_increasing(times)?;

    let mut out = Vec::with_capacity(targets.len() * n_series);

    for target in targets {
        // First sample strictly after the target.
        let after = times.partition_point(|t| t <= target);

        if after > 0 && times[after - 1] == *target {
            let row = after - 1;
            out.extend_from_slice(&block[row * n_series..(row + 1) * n_series]);
            continue;
        }

        if after == 0 || after == times.len() {
            return Err(outside(target, times));
        }

        let (i0, i1) = (after - 1, after);
        let span = (times[i1] - times[i0]).num_seconds() as f64;
        let w0 = (times[i1] - *target).num_seconds() as f64;
        let w1 = (*target - times[i0]).num_seconds() as f64;

        for s in 0..n_series {
            let v0 = block[i0 * n_series + s] as f64;
            let v1 = block[i1 * n_series + s] as f64;
            out.push(((v0 * w0 + v1 * w1) / span) as f32);
        }
    }

    Ok(out)
}

fn check_increasing(times: &[DateTime<Utc>]) -> Result<()> {
    for pair in times.windows(2) {
        if pair[1] <= pair[0] {
            return Err(GridLocatorError::NotMonotonic(format!(
                "{} followed by {}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}

fn outside(target: &DateTime<Utc>, times: &[DateTime<Utc>]) -> GridLocatorError {
    let fmt = |t: Option<&DateTime<Utc>>| t.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string());
    GridLocatorError::OutsideSamples {
        target: target.to_rfc3339(),
        first: fmt(times.first()),
        last: fmt(times.last()),
    }
}
