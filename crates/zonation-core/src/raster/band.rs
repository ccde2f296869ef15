//! Depth-band classifier.
//!
//! Selects cells whose elevation lies inside an inclusive band and merges
//! them into one polygon. The grid is built once and shared by every band
//! evaluated against it.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use super::dissolve::dissolve;
use super::CellGrid;
use crate::diagnostics::{Diagnostics, Warning};
use crate::parallel;

/// Inclusive elevation interval, both edges in negative metres with
/// `shallow >= deep` for a well-formed band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthBand {
    pub shallow: f32,
    pub deep: f32,
}

impl DepthBand {
    pub fn new(shallow: f32, deep: f32) -> Self {
        Self { shallow, deep }
    }

    /// Sea surface down to `limit`.
    pub fn surface_to(limit: f32) -> Self {
        Self { shallow: 0.0, deep: limit }
    }

    #[inline]
    pub fn contains(&self, elevation: f32) -> bool {
        elevation <= self.shallow && elevation >= self.deep
    }

    pub fn is_inverted(&self) -> bool {
        self.shallow < self.deep
    }
}

/// Cells selected by one band.
#[derive(Debug, Clone, Serialize)]
pub struct BandCandidate {
    pub band: DepthBand,
    pub cell_count: usize,
    pub area_m2: f64,
    pub geometry: MultiPolygon<f64>,
    #[serde(skip)]
    pub cells: Vec<usize>,
}

/// Indices of populated cells inside `band`, ascending.
pub fn select_cells(grid: &CellGrid, band: DepthBand) -> Vec<usize> {
    grid.cells()
        .filter(|c| band.contains(c.elevation))
        .map(|c| c.index)
        .collect()
}

/// Evaluate one band. Inverted or empty bands produce an empty candidate
/// and a warning.
pub fn classify(grid: &CellGrid, band: DepthBand) -> (BandCandidate, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let cells = if band.is_inverted() {
        diagnostics.push(Warning::InvertedBand { shallow: band.shallow, deep: band.deep });
        Vec::new()
    } else {
        select_cells(grid, band)
    };
    if cells.is_empty() && !band.is_inverted() {
        diagnostics.push(Warning::EmptyBand { shallow: band.shallow, deep: band.deep });
    }
    let candidate = BandCandidate {
        band,
        cell_count: cells.len(),
        area_m2: cells.len() as f64 * grid.spec.cell_area(),
        geometry: dissolve(&grid.spec, &cells),
        cells,
    };
    (candidate, diagnostics)
}

/// Evaluate every (shallow, deep) combination against the same grid.
///
/// Output is ordered shallow-major, matching the input slices, whether or
/// not the evaluation ran in parallel.
pub fn sweep(grid: &CellGrid, shallow: &[f32], deep: &[f32]) -> (Vec<BandCandidate>, Diagnostics) {
    let bands: Vec<DepthBand> = shallow
        .iter()
        .flat_map(|&s| deep.iter().map(move |&d| DepthBand::new(s, d)))
        .collect();
    log::info!("evaluating {} depth-band combinations", bands.len());

    let results = parallel::map(&bands, |&band| classify(grid, band));

    let mut diagnostics = Diagnostics::new();
    let mut candidates = Vec::with_capacity(results.len());
    for (candidate, diag) in results {
        diagnostics.extend(diag);
        candidates.push(candidate);
    }
    (candidates, diagnostics)
}
