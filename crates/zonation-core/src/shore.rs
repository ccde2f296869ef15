//! Shore-distance estimator.
//!
//! Minimum planar distance from a point to any land polygon. Each query
//! visits coastline features in order of their bounding-box lower bound and
//! stops as soon as that bound exceeds the best exact distance found, so only
//! the features that could hold the true nearest are measured exactly.

use geo::{BoundingRect, Coord, EuclideanDistance, LineString, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{InputShapeError, Result};
use crate::parallel;
use crate::projection::CoordinateProjection;
use crate::raster::CellGrid;

/// Land polygons, read-only once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coastline {
    features: Vec<Polygon<f64>>,
}

impl Coastline {
    /// Validate and wrap land polygons.
    pub fn new(features: Vec<Polygon<f64>>) -> Result<Self> {
        for (i, poly) in features.iter().enumerate() {
            let ext = &poly.exterior().0;
            let finite = poly
                .exterior()
                .coords()
                .chain(poly.interiors().iter().flat_map(|r| r.coords()))
                .all(|c| c.x.is_finite() && c.y.is_finite());
            if ext.len() < 4 || !finite {
                return Err(InputShapeError::DegenerateCoastline(i));
            }
        }
        Ok(Self { features })
    }

    /// Build from exterior rings given as (x, y) pairs; rings are closed
    /// automatically.
    pub fn from_rings(rings: Vec<Vec<(f64, f64)>>) -> Result<Self> {
        let features = rings
            .into_iter()
            .map(|ring| Polygon::new(LineString::from(ring), vec![]))
            .collect();
        Self::new(features)
    }

    pub fn features(&self) -> &[Polygon<f64>] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Reproject, reading each coordinate as (x = lon, y = lat).
    pub fn project<P: CoordinateProjection>(&self, proj: &P) -> Self {
        let map_ring = |ring: &LineString<f64>| -> LineString<f64> {
            ring.coords()
                .map(|c| {
                    let (x, y) = proj.geo_to_xy(c.y, c.x);
                    Coord { x, y }
                })
                .collect()
        };
        let features = self
            .features
            .iter()
            .map(|p| Polygon::new(map_ring(p.exterior()), p.interiors().iter().map(map_ring).collect()))
            .collect();
        Self { features }
    }
}

/// Coastline features paired with their bounding boxes.
pub struct ShoreIndex {
    entries: Vec<(Rect<f64>, Polygon<f64>)>,
}

impl ShoreIndex {
    pub fn new(coastline: &Coastline) -> Self {
        let entries = coastline
            .features
            .iter()
            .filter_map(|p| p.bounding_rect().map(|r| (r, p.clone())))
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distance from (x, y) to the nearest land polygon; zero on land,
    /// infinite when there is no coastline.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        let mut order: Vec<(f64, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (rect, _))| (rect_distance(rect, x, y), i))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let p = Point::new(x, y);
        let mut best = f64::INFINITY;
        for (bound, i) in order {
            if bound >= best {
                break;
            }
            best = best.min(p.euclidean_distance(&self.entries[i].1));
            if best == 0.0 {
                break;
            }
        }
        best
    }

    /// Distances for many points, in input order.
    pub fn distances(&self, points: &[(f64, f64)]) -> Vec<f64> {
        parallel::map(points, |&(x, y)| self.distance(x, y))
    }
}

/// Lower bound on the distance from (x, y) to anything inside `rect`.
fn rect_distance(rect: &Rect<f64>, x: f64, y: f64) -> f64 {
    let (min, max) = (rect.min(), rect.max());
    let dx = (min.x - x).max(0.0).max(x - max.x);
    let dy = (min.y - y).max(0.0).max(y - max.y);
    dx.hypot(dy)
}

/// Shore distance of every cell centre, empty cells included.
///
/// Empty cells are never zoned, but the coast-connectivity check walks
/// through them and needs to know which gaps lie against the coast.
pub fn shore_field(grid: &CellGrid, index: &ShoreIndex) -> Vec<f64> {
    let centres: Vec<(f64, f64)> = (0..grid.spec.len()).map(|i| grid.spec.cell_center(i)).collect();
    let field = index.distances(&centres);
    log::debug!(
        "shore distance computed for {} cells against {} features",
        centres.len(),
        index.entries.len()
    );
    field
}
