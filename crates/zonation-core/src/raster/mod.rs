//! Rasterizer: scattered soundings onto a regular grid of square cells.
//!
//! Cells are addressed row-major with row 0 at the southern edge. A cell
//! takes the elevation of the first sample (in input order) that falls in
//! its footprint and carries a value; there is no interpolation. Cells that
//! receive nothing stay NaN and are skipped by everything downstream.

pub mod band;
pub mod dissolve;

use geo::{Coord, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::bathymetry::ProjectedSample;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{InputShapeError, Result};

/// Upper bound on rows × cols; anything larger means the resolution is
/// wildly out of scale with the sample extent.
const MAX_CELLS: usize = 50_000_000;

/// Placement of the grid in projected metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// South-west corner of cell (0, 0).
    pub origin_x: f64,
    pub origin_y: f64,
    /// Cell edge length in metres.
    pub resolution: f64,
    pub cols: usize,
    pub rows: usize,
}

impl GridSpec {
    /// Smallest grid whose cell centres fall on sample positions of a
    /// regular lattice of spacing `resolution`.
    pub fn covering(samples: &[ProjectedSample], resolution: f64) -> Result<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(InputShapeError::InvalidResolution(resolution));
        }
        if samples.is_empty() {
            return Err(InputShapeError::EmptyBathymetry);
        }
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for s in samples {
            min_x = min_x.min(s.x);
            max_x = max_x.max(s.x);
            min_y = min_y.min(s.y);
            max_y = max_y.max(s.y);
        }
        let origin_x = min_x - resolution / 2.0;
        let origin_y = min_y - resolution / 2.0;
        let cols = ((max_x - origin_x) / resolution).floor() as usize + 1;
        let rows = ((max_y - origin_y) / resolution).floor() as usize + 1;
        if cols.saturating_mul(rows) > MAX_CELLS {
            return Err(InputShapeError::InvalidResolution(resolution));
        }
        Ok(Self { origin_x, origin_y, resolution, cols, rows })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn row_col(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Index of the cell containing (x, y), if inside the grid.
    pub fn index_of(&self, x: f64, y: f64) -> Option<usize> {
        let fc = ((x - self.origin_x) / self.resolution).floor();
        let fr = ((y - self.origin_y) / self.resolution).floor();
        if fc < 0.0 || fr < 0.0 {
            return None;
        }
        let (c, r) = (fc as usize, fr as usize);
        (c < self.cols && r < self.rows).then_some(r * self.cols + c)
    }

    /// X coordinate of the western edge of column `col`. Shared edges between
    /// neighbours are computed identically, so dissolved polygons have no slivers.
    #[inline]
    pub fn x_edge(&self, col: usize) -> f64 {
        self.origin_x + col as f64 * self.resolution
    }

    #[inline]
    pub fn y_edge(&self, row: usize) -> f64 {
        self.origin_y + row as f64 * self.resolution
    }

    pub fn cell_center(&self, index: usize) -> (f64, f64) {
        let (r, c) = self.row_col(index);
        (
            self.origin_x + (c as f64 + 0.5) * self.resolution,
            self.origin_y + (r as f64 + 0.5) * self.resolution,
        )
    }

    /// Rectangle covering columns `c0..=c1` of one row.
    pub fn run_rect(&self, row: usize, c0: usize, c1: usize) -> Rect<f64> {
        Rect::new(
            Coord { x: self.x_edge(c0), y: self.y_edge(row) },
            Coord { x: self.x_edge(c1 + 1), y: self.y_edge(row + 1) },
        )
    }

    pub fn cell_polygon(&self, index: usize) -> Polygon<f64> {
        let (r, c) = self.row_col(index);
        self.run_rect(r, c, c).to_polygon()
    }

    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.resolution * self.resolution
    }

    /// Length of a cell diagonal.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.resolution * std::f64::consts::SQRT_2
    }

    /// 4-connected neighbour indices.
    pub fn neighbours(&self, index: usize) -> impl Iterator<Item = usize> {
        let (r, c) = self.row_col(index);
        let cols = self.cols;
        [
            (r > 0).then(|| index - cols),
            (r + 1 < self.rows).then(|| index + cols),
            (c > 0).then(|| index - 1),
            (c + 1 < cols).then(|| index + 1),
        ]
        .into_iter()
        .flatten()
    }
}

/// A populated grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub index: usize,
    pub elevation: f32,
}

/// Elevation grid produced by [`rasterize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellGrid {
    pub spec: GridSpec,
    /// Row-major elevations in metres; NaN marks a cell without samples.
    pub elevation: Vec<f32>,
}

impl CellGrid {
    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.elevation.get(index).copied().filter(|e| e.is_finite())
    }

    /// Populated cells in index order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.elevation
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_finite())
            .map(|(index, &elevation)| Cell { index, elevation })
    }

    #[inline]
    pub fn is_land(&self, index: usize) -> bool {
        self.get(index).is_some_and(|e| e > 0.0)
    }

    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            cols: self.spec.cols,
            rows: self.spec.rows,
            resolution_m: self.spec.resolution,
            populated: 0,
            gaps: 0,
            land: 0,
            min_elevation: f32::INFINITY,
            max_elevation: f32::NEG_INFINITY,
        };
        for &e in &self.elevation {
            if !e.is_finite() {
                stats.gaps += 1;
                continue;
            }
            stats.populated += 1;
            if e > 0.0 {
                stats.land += 1;
            }
            stats.min_elevation = stats.min_elevation.min(e);
            stats.max_elevation = stats.max_elevation.max(e);
        }
        stats
    }
}

/// Size and content summary of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridStats {
    pub cols: usize,
    pub rows: usize,
    pub resolution_m: f64,
    pub populated: usize,
    pub gaps: usize,
    pub land: usize,
    pub min_elevation: f32,
    pub max_elevation: f32,
}

/// Native sample spacing.
///
/// Samples on a lattice (projected regular lon/lat grids stay regular) use
/// the smallest positive spacing between distinct positions, taken as the
/// larger of the two axes. Scattered clouds have nearly as many distinct
/// positions per axis as samples; they get the mean spacing
/// `sqrt(extent area / n)` instead.
pub fn infer_resolution(samples: &[ProjectedSample]) -> Result<f64> {
    let xs = AxisSpacing::of(samples.iter().map(|s| s.x).collect());
    let ys = AxisSpacing::of(samples.iter().map(|s| s.y).collect());

    let lattice = xs.distinct * ys.distinct <= 4 * samples.len();
    if !lattice && xs.span > 0.0 && ys.span > 0.0 {
        let r = (xs.span * ys.span / samples.len() as f64).sqrt();
        log::debug!("samples look scattered ({} x {} distinct positions), mean spacing {r:.1} m", xs.distinct, ys.distinct);
        return Ok(r);
    }
    match (xs.min_gap, ys.min_gap) {
        (Some(a), Some(b)) => Ok(a.max(b)),
        (Some(a), None) | (None, Some(a)) => Ok(a),
        (None, None) => Err(InputShapeError::UninferableResolution),
    }
}

struct AxisSpacing {
    distinct: usize,
    span: f64,
    min_gap: Option<f64>,
}

impl AxisSpacing {
    fn of(mut v: Vec<f64>) -> Self {
        v.sort_by(f64::total_cmp);
        let span = match (v.first(), v.last()) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        };
        let eps = span * 1e-9;
        let gaps: Vec<f64> = v.windows(2).map(|w| w[1] - w[0]).filter(|&d| d > eps).collect();
        Self {
            distinct: if v.is_empty() { 0 } else { gaps.len() + 1 },
            span,
            min_gap: gaps.into_iter().min_by(f64::total_cmp),
        }
    }
}

/// Assign samples to cells of `spec`.
///
/// Samples without elevation never claim a cell. Empty cells inside the
/// extent are reported as a single [`Warning::DataGap`].
pub fn rasterize(samples: &[ProjectedSample], spec: GridSpec) -> (CellGrid, Diagnostics) {
    let mut elevation = vec![f32::NAN; spec.len()];
    for s in samples.iter().filter(|s| s.elevation.is_finite()) {
        if let Some(i) = spec.index_of(s.x, s.y) {
            if elevation[i].is_nan() {
                elevation[i] = s.elevation;
            }
        }
    }

    let grid = CellGrid { spec, elevation };
    let mut diagnostics = Diagnostics::new();
    let stats = grid.stats();
    log::debug!(
        "rasterized {} samples onto {}x{} grid ({} populated)",
        samples.len(),
        spec.cols,
        spec.rows,
        stats.populated
    );
    if stats.gaps > 0 {
        diagnostics.push(Warning::DataGap { cells: stats.gaps });
    }
    (grid, diagnostics)
}
