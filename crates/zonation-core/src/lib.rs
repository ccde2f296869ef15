//! Domain partitioning for a two-zone, two-layer marine ecosystem model.
//!
//! Horizontal: depth soundings are rasterized, split by depth band and
//! distance to the coast into inshore and offshore polygons.
//! Vertical: diffusivity output is binned by depth and quarter with
//! deep-convection events counted apart, to support the choice of the
//! shallow/deep layer boundary.

pub mod bathymetry;
pub mod diagnostics;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod params;
pub mod pipeline;
pub mod profile;
pub mod projection;
pub mod raster;
pub mod shore;
pub mod zones;

mod parallel;

pub use bathymetry::DepthSample;
pub use diagnostics::{Diagnostics, Warning};
pub use error::InputShapeError;
pub use params::{ProfileParams, ZoningParams};
pub use pipeline::{analyse_profile, DomainPartitioner, DomainResult};
pub use profile::convection::{ConvectionClassifier, DEFAULT_CONVECTION_THRESHOLD};
pub use profile::{ProfileBin, ProfileGrid, Quarter, VerticalObservation};
pub use raster::band::{BandCandidate, DepthBand};
pub use raster::{CellGrid, GridSpec, GridStats};
pub use shore::{Coastline, ShoreIndex};
pub use zones::{Partition, Zone, ZonePolygon};
