//! Nearest non-missing ("wet") cell search.
//!
//! Wave fields are missing over land, so a station on the coast can resolve
//! to a dry cell. The search walks outward over 4-connected neighbours.

use std::collections::VecDeque;

use tracing::debug;

use crate::types::{GridField, GridIndex};

/// Breadth-first search from `start` for the first cell whose value is neither
/// `missing_value` nor NaN.
///
/// A wet start cell is returned as is. Only in-grid neighbours are enqueued;
/// `None` means the grid holds no wet cell reachable from `start`.
pub fn nearest_wet_point(field: &GridField, start: GridIndex, missing_value: f32) -> Option<GridIndex> {
    if start.y >= field.ny || start.x >= field.nx {
        return None;
    }

    let is_wet = |v: f32| !v.is_nan() && v != missing_value;

    let mut visited = vec![false; field.ny * field.nx];
    let mut queue = VecDeque::new();
    queue.push_back(start);
    visited[start.flat(field.nx)] = true;

    let mut expanded = 0usize;
    while let Some(current) = queue.pop_front() {
        if is_wet(field.data[current.flat(field.nx)]) {
            if current != start {
                debug!(
                    start = %start,
                    found = %current,
                    expanded = expanded,
                    "Moved to nearest wet point"
                );
            }
            return Some(current);
        }
        expanded += 1;

        // Same neighbour order as (+y, -y, +x, -x).
        let candidates = [
            (current.y + 1 < field.ny).then(|| GridIndex::new(current.y + 1, current.x)),
            current.y.checked_sub(1).map(|y| GridIndex::new(y, current.x)),
            (current.x + 1 < field.nx).then(|| GridIndex::new(current.y, current.x + 1)),
            current.x.checked_sub(1).map(|x| GridIndex::new(current.y, x)),
        ];

        for next in candidates.into_iter().flatten() {
            let flat = next.flat(field.nx);
            if !visited[flat] {
                visited[flat] = true;
                queue.push_back(next);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: f32 = -32767.0;

    fn field(rows: &[&[f32]]) -> GridField {
        let ny = rows.len();
        let nx = rows[0].len();
        GridField::new(rows.concat(), ny, nx).unwrap()
    }

    #[test]
    fn test_wet_start_returned_unchanged() {
        let f = field(&[&[1.0, MISSING], &[MISSING, MISSING]]);
        assert_eq!(nearest_wet_point(&f, GridIndex::new(0, 0), MISSING), Some(GridIndex::new(0, 0)));
    }

    #[test]
    fn test_finds_nearest_by_steps() {
        let f = field(&[
            &[MISSING, MISSING, MISSING, 5.0],
            &[MISSING, MISSING, MISSING, MISSING],
            &[MISSING, 7.0, MISSING, MISSING],
        ]);
        // (2,1) is 3 steps from (0,0); (0,3) is 3 steps too, but +y is explored first.
        assert_eq!(nearest_wet_point(&f, GridIndex::new(0, 0), MISSING), Some(GridIndex::new(2, 1)));
        assert_eq!(nearest_wet_point(&f, GridIndex::new(0, 2), MISSING), Some(GridIndex::new(0, 3)));
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let f = field(&[&[f32::NAN, 2.0]]);
        assert_eq!(nearest_wet_point(&f, GridIndex::new(0, 0), MISSING), Some(GridIndex::new(0, 1)));
    }

    #[test]
    fn test_all_dry_terminates_with_none() {
        let f = field(&[&[MISSING, MISSING], &[MISSING, f32::NAN]]);
        assert_eq!(nearest_wet_point(&f, GridIndex::new(1, 1), MISSING), None);
    }

    #[test]
    fn test_start_outside_grid() {
        let f = field(&[&[1.0]]);
        assert_eq!(nearest_wet_point(&f, GridIndex::new(3, 0), MISSING), None);
    }
}
