//! Nearest grid point search.

/// Flat index of the cell minimizing `max(|lon - grid_lon|, |lat - grid_lat|)`.
///
/// Cells whose coordinates are NaN are skipped. On equal distance the lowest
/// flat index wins. Returns `None` when no cell has finite coordinates.
pub fn nearest_curvilinear(grid_lon: &[f64], grid_lat: &[f64], lon: f64, lat: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (i, (&glon, &glat)) in grid_lon.iter().zip(grid_lat.iter()).enumerate() {
        let d = (glon - lon).abs().max((glat - lat).abs());
        if d.is_nan() {
            continue;
        }
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }

    best.map(|(i, _)| i)
}

/// Index of the axis value closest to `value`, lowest index on ties.
pub fn nearest_on_axis(axis: &[f64], value: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (i, &a) in axis.iter().enumerate() {
        let d = (a - value).abs();
        if d.is_nan() {
            continue;
        }
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }

    best.map(|(i, _)| i)
}

/// Bring a longitude into the convention of `axis` (0..360 or -180..180).
pub fn wrap_longitude(lon: f64, axis: &[f64]) -> f64 {
    let max = axis.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = axis.iter().copied().fold(f64::INFINITY, f64::min);

    if max > 180.0 && lon < 0.0 {
        lon + 360.0
    } else if min < 0.0 && lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_node() {
        let lon = vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
        let lat = vec![10.0, 10.0, 10.0, 11.0, 11.0, 11.0];
        assert_eq!(nearest_curvilinear(&lon, &lat, 2.0, 11.0), Some(5));
    }

    #[test]
    fn test_tie_takes_first_in_row_major_order() {
        let lon = vec![0.0, 1.0, 0.0, 1.0];
        let lat = vec![0.0, 0.0, 1.0, 1.0];
        // Equidistant from all four corners.
        assert_eq!(nearest_curvilinear(&lon, &lat, 0.5, 0.5), Some(0));
    }

    #[test]
    fn test_nan_cells_ignored() {
        let lon = vec![f64::NAN, 5.0];
        let lat = vec![f64::NAN, 60.0];
        assert_eq!(nearest_curvilinear(&lon, &lat, 0.0, 0.0), Some(1));
        assert_eq!(nearest_curvilinear(&[f64::NAN], &[f64::NAN], 0.0, 0.0), None);
    }

    #[test]
    fn test_chebyshev_not_euclidean() {
        // Cell 0: dlon 0.9, dlat 0.0 -> 0.9. Cell 1: dlon 0.6, dlat 0.6 -> 0.6.
        let lon = vec![0.9, 0.6];
        let lat = vec![0.0, 0.6];
        assert_eq!(nearest_curvilinear(&lon, &lat, 0.0, 0.0), Some(1));
    }

    #[test]
    fn test_axis_descending() {
        let lat = vec![90.0, 89.75, 89.5, 89.25];
        assert_eq!(nearest_on_axis(&lat, 89.6), Some(2));
        // Tie between 89.75 and 89.5 goes to the lower index.
        assert_eq!(nearest_on_axis(&lat, 89.625), Some(1));
    }

    #[test]
    fn test_wrap_longitude() {
        let east = vec![0.0, 90.0, 180.0, 270.0, 359.75];
        assert_eq!(wrap_longitude(-10.0, &east), 350.0);
        assert_eq!(wrap_longitude(10.0, &east), 10.0);

        let centred = vec![-180.0, 0.0, 179.75];
        assert_eq!(wrap_longitude(350.0, &centred), -10.0);
        assert_eq!(wrap_longitude(-10.0, &centred), -10.0);
    }
}
