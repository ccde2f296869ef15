//! Tunable thresholds for zone partitioning and profile aggregation.
//!
//! Defaults are the Barents Sea tuning. They are empirical and should be
//! re-derived for any other region.

use serde::{Deserialize, Serialize};

use crate::profile::convection::DEFAULT_CONVECTION_THRESHOLD;

/// Horizontal partitioning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoningParams {
    /// Upper (shallow) edge of the offshore depth band, metres, negative.
    pub shallow_limit: f32,
    /// Lower (deep) edge of the offshore depth band, metres, negative.
    pub deep_limit: f32,
    /// Offshore cells must be at least this far from any coastline feature.
    pub min_shore_distance_m: f64,
    /// Grid cell edge in projected metres. Inferred from sample spacing if `None`.
    pub resolution_m: Option<f64>,
    /// Drop inshore cells that cannot reach the coast without crossing offshore.
    pub require_coast_connection: bool,
}

impl Default for ZoningParams {
    fn default() -> Self {
        Self {
            shallow_limit: -60.0,
            deep_limit: -500.0,
            min_shore_distance_m: 20_000.0,
            resolution_m: None,
            require_coast_connection: true,
        }
    }
}

/// Vertical profile parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileParams {
    /// Diffusivity at or above which an observation is a deep-convection event.
    pub convection_threshold: f64,
    /// Candidate shallow/deep layer boundary, metres, positive down.
    pub boundary_depth_m: f64,
    /// Depth key precision; observations closer than this share a bin.
    pub depth_resolution_m: f64,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            convection_threshold: DEFAULT_CONVECTION_THRESHOLD,
            boundary_depth_m: 60.0,
            depth_resolution_m: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let p: ZoningParams = serde_json::from_str(r#"{"min_shore_distance_m": 5000.0}"#).unwrap();
        assert_eq!(p.min_shore_distance_m, 5000.0);
        assert_eq!(p.shallow_limit, -60.0);
        assert!(p.resolution_m.is_none());
        assert!(p.require_coast_connection);
    }

    #[test]
    fn profile_defaults_match_reference_tuning() {
        let p = ProfileParams::default();
        assert_eq!(p.convection_threshold, 0.14);
        assert_eq!(p.boundary_depth_m, 60.0);
    }
}
