//! Fatal input validation errors.
//!
//! Anything reported here aborts the stage that raised it; no partial output
//! is produced. Recoverable conditions live in [`crate::diagnostics`].

use thiserror::Error;

/// Structural problem with a bathymetry, coastline or vertical-profile input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputShapeError {
    /// The bathymetry collection has no samples at all.
    #[error("bathymetry collection is empty")]
    EmptyBathymetry,

    /// Every sample is missing its elevation value.
    #[error("bathymetry has no elevation values ({0} samples, all missing)")]
    NoElevation(usize),

    /// A sample coordinate is NaN or infinite.
    #[error("sample {index} has a non-finite coordinate (lon {lon}, lat {lat})")]
    NonFiniteCoordinate { index: usize, lon: f64, lat: f64 },

    /// A coastline ring has fewer than four vertices or a non-finite vertex.
    #[error("coastline feature {0} is not a valid closed ring")]
    DegenerateCoastline(usize),

    /// Grid resolution is not a positive finite number, or is too fine for
    /// the sample extent.
    #[error("grid resolution must be positive, finite and coarse enough for the extent, got {0}")]
    InvalidResolution(f64),

    /// No usable resolution could be derived from the sample positions.
    #[error("cannot infer grid resolution from the sample positions; set resolution_m explicitly")]
    UninferableResolution,

    /// A vertical observation carries a negative or non-finite value.
    #[error("observation {index}: {field} must be finite and non-negative, got {value}")]
    InvalidObservation {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

pub type Result<T> = std::result::Result<T, InputShapeError>;
