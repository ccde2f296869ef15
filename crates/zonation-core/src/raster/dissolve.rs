//! Merge grid cells into a single (multi)polygon.
//!
//! Selected cells are first grouped into horizontal runs, one rectangle per
//! run, and the rectangles are then unioned pairwise in a fixed order. The
//! reduction order only depends on the sorted cell indices, so the output is
//! reproducible.

use geo::{BooleanOps, MultiPolygon};

use super::GridSpec;

/// Union of the cells at `indices`. Order and duplicates in `indices` are irrelevant.
pub fn dissolve(spec: &GridSpec, indices: &[usize]) -> MultiPolygon<f64> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut runs = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let start = sorted[i];
        let (row, c0) = spec.row_col(start);
        let mut c1 = c0;
        while i + 1 < sorted.len() && sorted[i + 1] == sorted[i] + 1 && spec.row_col(sorted[i + 1]).0 == row {
            i += 1;
            c1 += 1;
        }
        runs.push(MultiPolygon(vec![spec.run_rect(row, c0, c1).to_polygon()]));
        i += 1;
    }
    union_all(runs)
}

/// Balanced pairwise union.
fn union_all(mut parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    while parts.len() > 1 {
        let mut next = Vec::with_capacity(parts.len().div_ceil(2));
        let mut it = parts.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => next.push(a.union(&b)),
                None => next.push(a),
            }
        }
        parts = next;
    }
    parts.pop().unwrap_or_else(|| MultiPolygon(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Area;

    fn spec(cols: usize, rows: usize) -> GridSpec {
        GridSpec { origin_x: 0.0, origin_y: 0.0, resolution: 2.0, cols, rows }
    }

    #[test]
    fn empty_selection_is_empty_polygon() {
        assert!(dissolve(&spec(3, 3), &[]).0.is_empty());
    }

    #[test]
    fn adjacent_cells_merge_into_one_part() {
        let s = spec(3, 3);
        // L-shape: bottom row plus left column.
        let mp = dissolve(&s, &[0, 1, 2, 3, 6]);
        assert_eq!(mp.0.len(), 1);
        assert!(mp.0[0].interiors().is_empty());
        assert_relative_eq!(mp.unsigned_area(), 5.0 * 4.0, epsilon = 1e-9);
    }

    #[test]
    fn ring_of_cells_keeps_hole() {
        let s = spec(3, 3);
        let ring: Vec<usize> = (0..9).filter(|&i| i != 4).collect();
        let mp = dissolve(&s, &ring);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert_relative_eq!(mp.unsigned_area(), 8.0 * 4.0, epsilon = 1e-9);
    }

    #[test]
    fn separated_cells_stay_separate() {
        let s = spec(4, 1);
        let mp = dissolve(&s, &[0, 3, 3]);
        assert_eq!(mp.0.len(), 2);
        assert_relative_eq!(mp.unsigned_area(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn runs_do_not_wrap_across_rows() {
        let s = spec(2, 2);
        // Index 1 (row 0, last col) and 2 (row 1, first col) are consecutive
        // but only touch at a corner.
        let mp = dissolve(&s, &[1, 2]);
        assert_relative_eq!(mp.unsigned_area(), 8.0, epsilon = 1e-9);
    }
}
