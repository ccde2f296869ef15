//! Depth soundings as handed over by the data loader.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{InputShapeError, Result};
use crate::projection::{CoordinateProjection, GeoBounds};

fn null_as_nan<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f32, D::Error> {
    let v: Option<f32> = Option::deserialize(d)?;
    Ok(v.unwrap_or(f32::NAN))
}

/// One depth sounding in geographic coordinates.
///
/// Elevation is signed metres (negative below sea level). A missing value
/// is stored as NaN; the `elevation` field itself must be present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthSample {
    pub lon: f64,
    pub lat: f64,
    #[serde(deserialize_with = "null_as_nan")]
    pub elevation: f32,
}

impl DepthSample {
    pub fn new(lon: f64, lat: f64, elevation: f32) -> Self {
        Self { lon, lat, elevation }
    }

    pub fn has_elevation(&self) -> bool {
        self.elevation.is_finite()
    }
}

/// A sounding after projection to metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedSample {
    pub x: f64,
    pub y: f64,
    pub elevation: f32,
}

/// Check structural validity of a bathymetry collection.
///
/// Fails on an empty collection, any non-finite coordinate, or when no
/// sample carries an elevation. Individual missing elevations are fine.
pub fn validate(samples: &[DepthSample]) -> Result<()> {
    if samples.is_empty() {
        return Err(InputShapeError::EmptyBathymetry);
    }
    for (index, s) in samples.iter().enumerate() {
        if !s.lon.is_finite() || !s.lat.is_finite() {
            return Err(InputShapeError::NonFiniteCoordinate { index, lon: s.lon, lat: s.lat });
        }
    }
    if !samples.iter().any(DepthSample::has_elevation) {
        return Err(InputShapeError::NoElevation(samples.len()));
    }
    Ok(())
}

/// Geographic bounds of the samples.
pub fn bounds(samples: &[DepthSample]) -> Option<GeoBounds> {
    GeoBounds::from_points(samples.iter().map(|s| (s.lon, s.lat)))
}

/// Project every sample, preserving input order.
pub fn project<P: CoordinateProjection>(samples: &[DepthSample], proj: &P) -> Vec<ProjectedSample> {
    samples
        .iter()
        .map(|s| {
            let (x, y) = proj.geo_to_xy(s.lat, s.lon);
            ProjectedSample { x, y, elevation: s.elevation }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Identity;

    #[test]
    fn null_elevation_becomes_missing() {
        let s: Vec<DepthSample> = serde_json::from_str(
            r#"[{"lon": 1.0, "lat": 2.0, "elevation": null}, {"lon": 1.0, "lat": 3.0, "elevation": -40.0}]"#,
        )
        .unwrap();
        assert!(!s[0].has_elevation());
        assert_eq!(s[1].elevation, -40.0);
    }

    #[test]
    fn missing_elevation_field_is_rejected() {
        let r: std::result::Result<Vec<DepthSample>, _> =
            serde_json::from_str(r#"[{"lon": 1.0, "lat": 2.0}]"#);
        assert!(r.is_err());
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        assert_eq!(validate(&[]), Err(InputShapeError::EmptyBathymetry));
        let nan = [DepthSample::new(f64::NAN, 0.0, -1.0)];
        assert!(matches!(validate(&nan), Err(InputShapeError::NonFiniteCoordinate { index: 0, .. })));
        let blank = [DepthSample::new(0.0, 0.0, f32::NAN)];
        assert_eq!(validate(&blank), Err(InputShapeError::NoElevation(1)));
        let ok = [DepthSample::new(0.0, 0.0, f32::NAN), DepthSample::new(1.0, 0.0, -3.0)];
        assert!(validate(&ok).is_ok());
    }

    #[test]
    fn identity_projection_keeps_order_and_values() {
        let s = [DepthSample::new(5.0, 6.0, -7.0), DepthSample::new(1.0, 2.0, -3.0)];
        let p = project(&s, &Identity);
        assert_eq!(p[0], ProjectedSample { x: 5.0, y: 6.0, elevation: -7.0 });
        assert_eq!(p[1].x, 1.0);
    }
}
