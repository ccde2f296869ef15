//! End-to-end orchestration of the horizontal and vertical analyses.

use crate::bathymetry::{self, DepthSample};
use crate::diagnostics::Diagnostics;
use crate::error::{InputShapeError, Result};
use crate::params::{ProfileParams, ZoningParams};
use crate::profile::convection::ConvectionClassifier;
use crate::profile::{aggregate, ProfileGrid, VerticalObservation};
use crate::projection::{CoordinateProjection, LocalProjection};
use crate::raster::band::{sweep, BandCandidate};
use crate::raster::{infer_resolution, rasterize, CellGrid, GridSpec};
use crate::shore::{shore_field, Coastline, ShoreIndex};
use crate::zones::{partition, Partition};

/// Everything derived for one parameter set.
pub struct DomainResult {
    /// Set when the partitioner chose the projection itself.
    pub projection: Option<LocalProjection>,
    pub grid: CellGrid,
    /// Per-cell distance to land in metres, empty cells included.
    pub shore_distance_m: Vec<f64>,
    pub partition: Partition,
    /// Rasterization and partition warnings, in that order.
    pub diagnostics: Diagnostics,
}

impl DomainResult {
    /// Evaluate alternative offshore bands on the already-built grid.
    pub fn sweep(&self, shallow: &[f32], deep: &[f32]) -> (Vec<BandCandidate>, Diagnostics) {
        sweep(&self.grid, shallow, deep)
    }
}

/// Rasterize → shore distance → partition.
pub struct DomainPartitioner {
    params: ZoningParams,
}

impl DomainPartitioner {
    pub fn new(params: ZoningParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ZoningParams {
        &self.params
    }

    /// Run on geographic inputs, projecting onto a tangent plane centred on
    /// the bathymetry extent.
    pub fn run(&self, samples: &[DepthSample], coastline: &Coastline) -> Result<DomainResult> {
        bathymetry::validate(samples)?;
        let bounds = bathymetry::bounds(samples).ok_or(InputShapeError::EmptyBathymetry)?;
        let proj = LocalProjection::centered_on(&bounds);
        let mut result = self.run_validated(samples, coastline, &proj)?;
        result.projection = Some(proj);
        Ok(result)
    }

    /// Run with a caller-supplied projection.
    pub fn run_with<P: CoordinateProjection>(
        &self,
        samples: &[DepthSample],
        coastline: &Coastline,
        proj: &P,
    ) -> Result<DomainResult> {
        bathymetry::validate(samples)?;
        self.run_validated(samples, coastline, proj)
    }

    fn run_validated<P: CoordinateProjection>(
        &self,
        samples: &[DepthSample],
        coastline: &Coastline,
        proj: &P,
    ) -> Result<DomainResult> {
        let projected = bathymetry::project(samples, proj);
        let coast = coastline.project(proj);

        let spec = match self.params.resolution_m {
            Some(r) => GridSpec::covering(&projected, r)?,
            None => {
                let r = infer_resolution(&projected)?;
                log::info!("inferred grid resolution {r:.1} m");
                // The caller never chose this value, so do not blame it.
                GridSpec::covering(&projected, r).map_err(|_| InputShapeError::UninferableResolution)?
            }
        };
        let (grid, mut diagnostics) = rasterize(&projected, spec);

        let index = ShoreIndex::new(&coast);
        let shore_distance_m = shore_field(&grid, &index);
        let partition = partition(&grid, &shore_distance_m, !index.is_empty(), &self.params);
        diagnostics.extend(partition.diagnostics.clone());

        Ok(DomainResult { projection: None, grid, shore_distance_m, partition, diagnostics })
    }
}

/// Classify and aggregate vertical observations.
pub fn analyse_profile(observations: &[VerticalObservation], params: &ProfileParams) -> Result<ProfileGrid> {
    let classifier = ConvectionClassifier::new(params.convection_threshold);
    aggregate(observations, &classifier, params.depth_resolution_m)
}
