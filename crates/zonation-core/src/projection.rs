//! Geographic to projected coordinates.
//!
//! The analysis area is a bounded region (a few hundred km), so a
//! tangent-plane projection on the WGS84 ellipsoid is accurate enough for
//! distance thresholds of tens of kilometres.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// Bounds of a set of (lon, lat) pairs. `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (lon, lat) = it.next()?;
        let mut b = Self { min_lon: lon, min_lat: lat, max_lon: lon, max_lat: lat };
        for (lon, lat) in it {
            b.min_lon = b.min_lon.min(lon);
            b.max_lon = b.max_lon.max(lon);
            b.min_lat = b.min_lat.min(lat);
            b.max_lat = b.max_lat.max(lat);
        }
        Some(b)
    }

    /// (lat, lon) of the centre.
    pub fn center(&self) -> (f64, f64) {
        ((self.min_lat + self.max_lat) / 2.0, (self.min_lon + self.max_lon) / 2.0)
    }
}

/// Forward and inverse mapping between (lat, lon) degrees and (x, y) metres.
pub trait CoordinateProjection {
    fn geo_to_xy(&self, lat: f64, lon: f64) -> (f64, f64);
    fn xy_to_geo(&self, x: f64, y: f64) -> (f64, f64);
}

/// Tangent-plane projection about a reference point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalProjection {
    ref_lat: f64,
    ref_lon: f64,
    meters_per_deg_lat: f64,
    meters_per_deg_lon: f64,
}

impl LocalProjection {
    /// WGS84 equatorial radius in metres.
    const A: f64 = 6_378_137.0;
    /// WGS84 flattening.
    const F: f64 = 1.0 / 298.257_223_563;

    pub fn new(ref_lat: f64, ref_lon: f64) -> Self {
        let lat_rad = ref_lat * PI / 180.0;
        let e2 = 2.0 * Self::F - Self::F * Self::F;
        let sin2 = lat_rad.sin() * lat_rad.sin();

        // Meridional and prime-vertical radii of curvature.
        let rho = Self::A * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);
        let nu = Self::A / (1.0 - e2 * sin2).sqrt();

        Self {
            ref_lat,
            ref_lon,
            meters_per_deg_lat: rho * PI / 180.0,
            meters_per_deg_lon: nu * lat_rad.cos() * PI / 180.0,
        }
    }

    /// Projection centred on the middle of `bounds`.
    pub fn centered_on(bounds: &GeoBounds) -> Self {
        let (lat, lon) = bounds.center();
        Self::new(lat, lon)
    }

    /// (metres per degree latitude, metres per degree longitude).
    pub fn scale_factors(&self) -> (f64, f64) {
        (self.meters_per_deg_lat, self.meters_per_deg_lon)
    }
}

impl CoordinateProjection for LocalProjection {
    fn geo_to_xy(&self, lat: f64, lon: f64) -> (f64, f64) {
        (
            (lon - self.ref_lon) * self.meters_per_deg_lon,
            (lat - self.ref_lat) * self.meters_per_deg_lat,
        )
    }

    fn xy_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.ref_lat + y / self.meters_per_deg_lat,
            self.ref_lon + x / self.meters_per_deg_lon,
        )
    }
}

/// Pass-through for inputs that are already in projected metres
/// (longitude read as x, latitude as y).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity;

impl CoordinateProjection for Identity {
    fn geo_to_xy(&self, lat: f64, lon: f64) -> (f64, f64) {
        (lon, lat)
    }

    fn xy_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        (y, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_trip_near_reference() {
        let proj = LocalProjection::new(72.0, 30.0);
        let (x, y) = proj.geo_to_xy(72.5, 31.2);
        let (lat, lon) = proj.xy_to_geo(x, y);
        assert_relative_eq!(lat, 72.5, epsilon = 1e-10);
        assert_relative_eq!(lon, 31.2, epsilon = 1e-10);
    }

    #[test]
    fn degree_of_latitude_is_about_111_km() {
        let proj = LocalProjection::new(0.0, 0.0);
        let (_, y) = proj.geo_to_xy(1.0, 0.0);
        assert!((y - 110_574.0).abs() < 50.0, "got {y}");
    }

    #[test]
    fn longitude_shrinks_towards_the_pole() {
        let proj = LocalProjection::new(75.0, 0.0);
        let (lat_scale, lon_scale) = proj.scale_factors();
        assert!(lon_scale < lat_scale * 0.3);
    }

    #[test]
    fn bounds_center() {
        let b = GeoBounds::from_points([(10.0, 70.0), (30.0, 80.0), (20.0, 75.0)]).unwrap();
        assert_eq!(b.center(), (75.0, 20.0));
        assert_eq!((b.min_lon, b.max_lat), (10.0, 80.0));
    }
}
