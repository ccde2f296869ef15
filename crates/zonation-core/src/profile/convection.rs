//! Deep-convection classifier.
//!
//! Diffusivity values spread over a plausible range except for a disjoint
//! high cluster produced by full water-column overturning. Anything at or
//! above the threshold belongs to that cluster.

use serde::{Deserialize, Serialize};

use super::VerticalObservation;

/// Barents Sea tuning (m²/s).
pub const DEFAULT_CONVECTION_THRESHOLD: f64 = 0.14;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvectionClassifier {
    threshold: f64,
}

impl ConvectionClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn is_event(&self, diffusivity: f64) -> bool {
        diffusivity >= self.threshold
    }

    #[inline]
    pub fn classify(&self, obs: &VerticalObservation) -> bool {
        self.is_event(obs.diffusivity)
    }
}

impl Default for ConvectionClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CONVECTION_THRESHOLD)
    }
}
