//! Test support shared by the workspace crates.
//!
//! - [`fixtures`]: stations, domains and dates with known archive behaviour.
//! - [`generators`]: synthetic coordinate fields, coastal masks and
//!   cycle-structured accumulations with known hourly increments.
//! - [`paths`]: optional real archive samples and scratch directories.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Return early from a test when a sample archive file is not available.
///
/// ```ignore
/// let path = require_test_file!("fc2020010100_004_fp.nc");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: '{}' not found (set {} to a directory of sample files)",
                    $name,
                    $crate::TEST_DATA_ENV
                );
                return;
            }
        }
    }};
}

/// Element-wise comparison of two series within `epsilon`.
///
/// NaN matches NaN, so gaps must line up.
#[macro_export]
macro_rules! assert_series_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = $left;
        let right = $right;
        assert_eq!(
            left.len(),
            right.len(),
            "series length mismatch: {} vs {}",
            left.len(),
            right.len()
        );
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let (l, r) = (*l as f64, *r as f64);
            let both_nan = l.is_nan() && r.is_nan();
            if !both_nan && !((l - r).abs() <= $epsilon as f64) {
                panic!("series differ at index {}: {} vs {}", i, l, r);
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_series_within_epsilon() {
        assert_series_approx_eq!(&[1.0001_f32, 2.0], &[1.0_f32, 2.0], 0.001);
        assert_series_approx_eq!(&[f32::NAN, 2.0], &[f32::NAN, 2.0], 0.001);
    }

    #[test]
    #[should_panic(expected = "series differ at index 1")]
    fn test_series_outside_epsilon() {
        assert_series_approx_eq!(&[1.0_f32, 2.5], &[1.0_f32, 2.0], 0.001);
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn test_series_length() {
        assert_series_approx_eq!(&[1.0_f32], &[1.0_f32, 2.0], 0.001);
    }
}
