//! Zone partitioner: inshore and offshore polygons from depth and shore distance.
//!
//! Offshore is the depth band restricted to cells at least the minimum
//! distance from land. Inshore is everything between the coast and the
//! offshore zone: water from the surface down to the offshore shallow limit,
//! plus band cells dropped for being too close to shore. Cells deeper than
//! the band, land and empty cells belong to neither zone.

use std::collections::VecDeque;
use std::fmt;

use geo::MultiPolygon;
use serde::Serialize;

use crate::diagnostics::{Diagnostics, Warning};
use crate::params::ZoningParams;
use crate::raster::band::DepthBand;
use crate::raster::dissolve::dissolve;
use crate::raster::CellGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    Inshore,
    Offshore,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Inshore => write!(f, "inshore"),
            Zone::Offshore => write!(f, "offshore"),
        }
    }
}

/// One zone of the partition, in projected metres.
#[derive(Debug, Clone, Serialize)]
pub struct ZonePolygon {
    pub zone: Zone,
    /// Depth range of the zone. Inshore reaches the offshore deep limit when
    /// band cells were dropped for lying too close to shore.
    pub band: DepthBand,
    pub geometry: MultiPolygon<f64>,
    pub cell_count: usize,
    pub area_m2: f64,
    /// Shallowest and deepest elevation actually present.
    pub elevation_range: Option<(f32, f32)>,
    pub mean_shore_distance_m: Option<f64>,
    #[serde(skip)]
    pub cells: Vec<usize>,
}

impl ZonePolygon {
    fn build(zone: Zone, band: DepthBand, cells: Vec<usize>, grid: &CellGrid, shore: &[f64]) -> Self {
        let elevation_range = cells
            .iter()
            .filter_map(|&i| grid.get(i))
            .fold(None, |acc: Option<(f32, f32)>, e| match acc {
                None => Some((e, e)),
                Some((hi, lo)) => Some((hi.max(e), lo.min(e))),
            });
        let finite: Vec<f64> = cells.iter().map(|&i| shore[i]).filter(|d| d.is_finite()).collect();
        let mean_shore_distance_m =
            (!finite.is_empty()).then(|| finite.iter().sum::<f64>() / finite.len() as f64);
        Self {
            zone,
            band,
            geometry: dissolve(&grid.spec, &cells),
            cell_count: cells.len(),
            area_m2: cells.len() as f64 * grid.spec.cell_area(),
            elevation_range,
            mean_shore_distance_m,
            cells,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Inshore/offshore split of a grid.
#[derive(Debug, Clone, Serialize)]
pub struct Partition {
    pub inshore: ZonePolygon,
    pub offshore: ZonePolygon,
    /// Shallow water cells left out because they cannot reach the coast.
    pub unreachable_cells: usize,
    pub diagnostics: Diagnostics,
}

impl Partition {
    /// No cell is assigned to both zones.
    pub fn is_disjoint(&self) -> bool {
        let (a, b) = (&self.inshore.cells, &self.offshore.cells);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return false,
            }
        }
        true
    }

    pub fn zone_of(&self, cell: usize) -> Option<Zone> {
        if self.offshore.cells.binary_search(&cell).is_ok() {
            Some(Zone::Offshore)
        } else if self.inshore.cells.binary_search(&cell).is_ok() {
            Some(Zone::Inshore)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Class {
    Outside,
    Offshore,
    InshoreCandidate,
}

/// Split `grid` into inshore and offshore zones.
///
/// `shore` holds the shore distance of every cell (see
/// [`crate::shore::shore_field`]); `coastline_known` says whether any
/// coastline feature was supplied, which decides how coast-adjacent cells
/// are found for the connectivity check.
pub fn partition(grid: &CellGrid, shore: &[f64], coastline_known: bool, params: &ZoningParams) -> Partition {
    let mut diagnostics = Diagnostics::new();
    let offshore_band = DepthBand::new(params.shallow_limit, params.deep_limit);
    let inshore_band = DepthBand::surface_to(params.shallow_limit);
    let min_dist = params.min_shore_distance_m;
    let touch = grid.spec.diagonal();

    if offshore_band.is_inverted() {
        diagnostics.push(Warning::InvertedBand { shallow: offshore_band.shallow, deep: offshore_band.deep });
    }
    if min_dist <= 0.0 {
        diagnostics.push(Warning::NonPositiveShoreDistance { distance_m: min_dist });
    }

    let mut class = vec![Class::Outside; grid.spec.len()];
    for cell in grid.cells() {
        let d = shore[cell.index];
        let in_band = !offshore_band.is_inverted() && offshore_band.contains(cell.elevation);
        class[cell.index] = if in_band && d >= min_dist {
            Class::Offshore
        } else if in_band || inshore_band.contains(cell.elevation) {
            Class::InshoreCandidate
        } else {
            Class::Outside
        };
    }

    // Inshore must be reachable from the coast without crossing offshore.
    // Empty cells are passable so a strip of missing soundings along the
    // coast does not cut the shallows off.
    let mut unreachable_cells = 0;
    if params.require_coast_connection {
        let passable: Vec<bool> =
            (0..class.len()).map(|i| class[i] == Class::InshoreCandidate || grid.get(i).is_none()).collect();
        let seeds: Vec<usize> = (0..class.len())
            .filter(|&i| passable[i])
            .filter(|&i| {
                let near = coastline_known && shore[i] < touch;
                near || grid.spec.neighbours(i).any(|n| grid.is_land(n))
            })
            .collect();
        let has_coast = coastline_known || grid.cells().any(|c| c.elevation > 0.0);
        if has_coast {
            let reached = flood(grid, &passable, seeds);
            for (i, c) in class.iter_mut().enumerate() {
                if *c == Class::InshoreCandidate && !reached[i] {
                    *c = Class::Outside;
                    unreachable_cells += 1;
                }
            }
        }
    }
    if unreachable_cells > 0 {
        diagnostics.push(Warning::UnreachableShallowCells { cells: unreachable_cells });
    }

    let pick = |want: Class| -> Vec<usize> { (0..class.len()).filter(|&i| class[i] == want).collect() };
    let offshore_cells = pick(Class::Offshore);
    let inshore_cells = pick(Class::InshoreCandidate);

    if offshore_cells.is_empty() && !offshore_band.is_inverted() {
        diagnostics.push(Warning::EmptyBand { shallow: offshore_band.shallow, deep: offshore_band.deep });
    }
    let touching: Vec<usize> = offshore_cells
        .iter()
        .copied()
        .filter(|&i| shore[i] < touch || grid.spec.neighbours(i).any(|n| grid.is_land(n)))
        .collect();
    if !touching.is_empty() {
        let min_distance_m = touching.iter().map(|&i| shore[i]).fold(f64::INFINITY, f64::min);
        diagnostics.push(Warning::OffshoreTouchesCoast { cells: touching.len(), min_distance_m });
    }
    if inshore_cells.is_empty() {
        diagnostics.push(Warning::EmptyInshore);
    }
    // Band cells too close to shore sit in inshore too, deepening its range.
    let deepened = inshore_cells.iter().any(|&i| grid.get(i).is_some_and(|e| !inshore_band.contains(e)));
    let inshore_band = if deepened {
        DepthBand::new(inshore_band.shallow, offshore_band.deep)
    } else {
        inshore_band
    };

    log::info!(
        "partitioned grid: {} inshore, {} offshore, {} unreachable cells",
        inshore_cells.len(),
        offshore_cells.len(),
        unreachable_cells
    );

    Partition {
        inshore: ZonePolygon::build(Zone::Inshore, inshore_band, inshore_cells, grid, shore),
        offshore: ZonePolygon::build(Zone::Offshore, offshore_band, offshore_cells, grid, shore),
        unreachable_cells,
        diagnostics,
    }
}

/// Breadth-first reach over passable cells from `seeds`.
fn flood(grid: &CellGrid, passable: &[bool], seeds: Vec<usize>) -> Vec<bool> {
    let mut reached = vec![false; passable.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for s in seeds {
        if !reached[s] {
            reached[s] = true;
            queue.push_back(s);
        }
    }
    while let Some(i) = queue.pop_front() {
        for n in grid.spec.neighbours(i) {
            if !reached[n] && passable[n] {
                reached[n] = true;
                queue.push_back(n);
            }
        }
    }
    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::tests::grid_from_rows;
    use crate::shore::{shore_field, Coastline, ShoreIndex};
    use approx::assert_relative_eq;
    use geo::{Area, BooleanOps};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const RES: f64 = 5_000.0;

    /// Land for x < 0 over the whole test area.
    fn west_coast() -> Coastline {
        Coastline::from_rings(vec![vec![(-1e6, -1e6), (0.0, -1e6), (0.0, 1e6), (-1e6, 1e6)]]).unwrap()
    }

    fn run(grid: &CellGrid, params: &ZoningParams) -> Partition {
        let shore = shore_field(grid, &ShoreIndex::new(&west_coast()));
        partition(grid, &shore, true, params)
    }

    fn params(shallow: f32, deep: f32, dist: f64) -> ZoningParams {
        ZoningParams {
            shallow_limit: shallow,
            deep_limit: deep,
            min_shore_distance_m: dist,
            resolution_m: Some(RES),
            require_coast_connection: true,
        }
    }

    #[test]
    fn depth_band_picks_only_in_range_cell() {
        // Cell centres at 2.5, 7.5, ... km from shore; distance constraint off.
        let grid = grid_from_rows(RES, &[&[-10.0, -55.0, -200.0, -550.0, -900.0]]);
        let p = run(&grid, &params(-60.0, -500.0, 0.0));
        assert_eq!(p.offshore.cells, vec![2]);
        assert_eq!(p.inshore.cells, vec![0, 1]);
        assert_eq!(p.zone_of(3), None);
        assert_eq!(p.zone_of(4), None);
    }

    #[test]
    fn cell_too_close_to_shore_is_not_offshore() {
        // Centre of column 2 is 12.5 km out, column 3 is 17.5 km, column 4 is 22.5 km.
        let grid = grid_from_rows(RES, &[&[-20.0, -100.0, -150.0, -150.0, -150.0]]);
        let p = run(&grid, &params(-60.0, -500.0, 20_000.0));
        assert_eq!(p.offshore.cells, vec![4]);
        assert_eq!(p.zone_of(3), Some(Zone::Inshore));
        assert!(p.is_disjoint());
    }

    #[test]
    fn fifteen_km_cell_excluded_with_twenty_km_threshold() {
        let grid = grid_from_rows(10_000.0, &[&[-30.0, -200.0]]);
        // Column 1 centre sits at 15 km.
        let shore = shore_field(&grid, &ShoreIndex::new(&west_coast()));
        assert_relative_eq!(shore[1], 15_000.0, epsilon = 1e-6);
        let p = partition(&grid, &shore, true, &params(-60.0, -500.0, 20_000.0));
        assert!(p.offshore.is_empty());
        assert_eq!(p.zone_of(1), Some(Zone::Inshore));
        assert!(p.diagnostics.any(|w| matches!(w, Warning::EmptyBand { .. })));
    }

    #[test]
    fn small_distance_flags_offshore_touching_coast() {
        let grid = grid_from_rows(RES, &[&[-100.0, -100.0, -20.0]]);
        let p = run(&grid, &params(-60.0, -500.0, 1_000.0));
        assert!(p.diagnostics.any(|w| matches!(w, Warning::OffshoreTouchesCoast { .. })));
    }

    #[test]
    fn isolated_shallow_bank_is_unreachable() {
        // Shallow bank at column 4 sits beyond an offshore barrier.
        let grid = grid_from_rows(RES, &[&[-20.0, -200.0, -200.0, -200.0, -30.0, -200.0]]);
        let p = run(&grid, &params(-60.0, -500.0, 5_000.0));
        assert_eq!(p.unreachable_cells, 1);
        assert_eq!(p.zone_of(4), None);
        assert_eq!(p.inshore.cells, vec![0]);
        assert!(p.diagnostics.any(|w| *w == Warning::UnreachableShallowCells { cells: 1 }));
    }

    #[test]
    fn land_cells_are_never_zoned() {
        let grid = grid_from_rows(RES, &[&[12.0, -10.0, -300.0, -300.0, -300.0, -300.0]]);
        let p = run(&grid, &params(-60.0, -500.0, 15_000.0));
        assert_eq!(p.zone_of(0), None);
        assert_eq!(p.inshore.cells, vec![1, 2]);
        assert_eq!(p.offshore.cells, vec![3, 4, 5]);
    }

    #[test]
    fn coastal_gap_strip_keeps_inshore() {
        // Column 0 has no sounding; the shallows behind it still reach the coast.
        let grid = grid_from_rows(RES, &[&[f32::NAN, -20.0, -30.0, -200.0, -200.0, -200.0, -200.0]]);
        let p = run(&grid, &ZoningParams { resolution_m: Some(RES), ..Default::default() });
        assert_eq!(p.inshore.cells, vec![1, 2, 3]);
        assert_eq!(p.offshore.cells, vec![4, 5, 6]);
        assert_eq!(p.unreachable_cells, 0);
        assert_eq!(p.zone_of(0), None);
        assert!(!p.diagnostics.any(|w| *w == Warning::EmptyInshore));
    }

    #[test]
    fn gap_beyond_offshore_does_not_reconnect_bank() {
        let grid = grid_from_rows(RES, &[&[-20.0, -200.0, -200.0, f32::NAN, -30.0, -200.0]]);
        let p = run(&grid, &params(-60.0, -500.0, 5_000.0));
        assert_eq!(p.zone_of(4), None);
        assert_eq!(p.unreachable_cells, 1);
    }

    #[test]
    fn inshore_band_reaches_deep_limit_when_band_cells_are_dropped() {
        let grid = grid_from_rows(RES, &[&[-20.0, -100.0, -150.0, -150.0, -150.0]]);
        let p = run(&grid, &params(-60.0, -500.0, 20_000.0));
        assert_eq!(p.inshore.band, DepthBand::new(0.0, -500.0));
        assert_eq!(p.inshore.elevation_range, Some((-20.0, -150.0)));

        let p = run(&grid, &params(-60.0, -500.0, 0.0));
        assert_eq!(p.inshore.band, DepthBand::surface_to(-60.0));
    }

    #[test]
    fn all_deep_water_leaves_inshore_empty() {
        let grid = grid_from_rows(RES, &[&[-300.0, -300.0, -300.0]]);
        let p = run(&grid, &params(-60.0, -500.0, 0.0));
        assert!(p.inshore.is_empty());
        assert!(p.diagnostics.any(|w| *w == Warning::EmptyInshore));
    }

    #[test]
    fn zones_never_overlap_for_random_thresholds() {
        let mut rng = StdRng::seed_from_u64(42);
        let rows: Vec<Vec<f32>> = (0..10)
            .map(|_| {
                (0..10)
                    .map(|c| {
                        // Deepening eastwards with noise, occasional gap.
                        if rng.gen_bool(0.05) {
                            f32::NAN
                        } else {
                            -(c as f32) * 60.0 + rng.gen_range(-40.0..40.0)
                        }
                    })
                    .collect()
            })
            .collect();
        let refs: Vec<&[f32]> = rows.iter().map(|r| r.as_slice()).collect();
        let grid = grid_from_rows(RES, &refs);
        let shore = shore_field(&grid, &ShoreIndex::new(&west_coast()));

        for _ in 0..25 {
            let s = rng.gen_range(-200.0f32..-10.0);
            let d = rng.gen_range(-700.0f32..s);
            let dist = rng.gen_range(0.0..40_000.0);
            let p = partition(&grid, &shore, true, &params(s, d, dist));
            assert!(p.is_disjoint());
            let overlap = p.inshore.geometry.intersection(&p.offshore.geometry).unsigned_area();
            assert!(overlap < 1e-3, "overlap {overlap} for [{s}, {d}] at {dist} m");
            for &i in &p.offshore.cells {
                assert!(shore[i] >= dist);
            }
        }
    }
}
