//! Vertical profile aggregator.
//!
//! Bins (depth, diffusivity) observations into a depth × quarter grid.
//! Deep-convection events are kept out of the mean and counted separately.
//! Depths are keyed at their native resolution; there is no coarser binning.

pub mod convection;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{InputShapeError, Result};
use convection::ConvectionClassifier;

/// Three-month calendar bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Quarter of a calendar month (1 = January). `None` outside 1..=12.
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            1..=3 => Some(Quarter::Q1),
            4..=6 => Some(Quarter::Q2),
            7..=9 => Some(Quarter::Q3),
            10..=12 => Some(Quarter::Q4),
            _ => None,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One diffusivity sample from the ocean model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalObservation {
    /// Metres below the surface.
    pub depth: f64,
    pub diffusivity: f64,
    pub year: i32,
    pub quarter: Quarter,
    /// Horizontal area represented by this sample at this depth.
    #[serde(default)]
    pub area: f64,
}

/// Reject negative or non-finite depth, diffusivity or area.
pub fn validate(observations: &[VerticalObservation]) -> Result<()> {
    for (index, o) in observations.iter().enumerate() {
        for (field, value) in [("depth", o.depth), ("diffusivity", o.diffusivity), ("area", o.area)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(InputShapeError::InvalidObservation { index, field, value });
            }
        }
    }
    Ok(())
}

/// Aggregates for one (depth, quarter) slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileBin {
    pub depth_m: f64,
    pub quarter: Quarter,
    /// Mean over non-convective observations; `None` when every observation
    /// was a convection event.
    pub mean_diffusivity: Option<f64>,
    pub min_diffusivity: Option<f64>,
    pub max_diffusivity: Option<f64>,
    /// Events / all observations in the slot.
    pub convection_fraction: f64,
    pub n_samples: usize,
    pub n_events: usize,
    /// Summed area of the non-convective observations.
    pub sampled_area: f64,
}

/// Convection event rate for one year and quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyRate {
    pub year: i32,
    pub quarter: Quarter,
    pub n_samples: usize,
    pub n_events: usize,
    pub convection_fraction: f64,
}

/// Mixing contrast either side of a layer boundary within one quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerContrast {
    pub quarter: Quarter,
    pub boundary_depth_m: f64,
    /// Sample-weighted mean over non-convective observations above the boundary.
    pub above_mean: Option<f64>,
    pub below_mean: Option<f64>,
    pub above_convection_fraction: Option<f64>,
    pub below_convection_fraction: Option<f64>,
}

/// Depth × quarter grid of [`ProfileBin`]s, sorted by quarter then depth.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileGrid {
    pub threshold: f64,
    pub depth_resolution_m: f64,
    pub bins: Vec<ProfileBin>,
    pub yearly: Vec<YearlyRate>,
    pub diagnostics: Diagnostics,
}

impl ProfileGrid {
    fn key(&self, depth: f64) -> i64 {
        depth_key(depth, self.depth_resolution_m)
    }

    pub fn get(&self, depth: f64, quarter: Quarter) -> Option<&ProfileBin> {
        let k = self.key(depth);
        self.bins
            .iter()
            .find(|b| b.quarter == quarter && self.key(b.depth_m) == k)
    }

    pub fn quarter(&self, quarter: Quarter) -> impl Iterator<Item = &ProfileBin> {
        self.bins.iter().filter(move |b| b.quarter == quarter)
    }

    /// Distinct depths present in any quarter, ascending.
    pub fn depths(&self) -> Vec<f64> {
        let mut seen = BTreeMap::new();
        for b in &self.bins {
            seen.entry(self.key(b.depth_m)).or_insert(b.depth_m);
        }
        seen.into_values().collect()
    }

    /// (depth, sampled area) for one quarter, shallow first.
    pub fn area_profile(&self, quarter: Quarter) -> Vec<(f64, f64)> {
        self.quarter(quarter).map(|b| (b.depth_m, b.sampled_area)).collect()
    }

    /// Per quarter, the bin whose depth is nearest to `depth`.
    pub fn at_boundary(&self, depth: f64) -> Vec<&ProfileBin> {
        Quarter::ALL
            .iter()
            .filter_map(|&q| {
                self.quarter(q)
                    .min_by(|a, b| (a.depth_m - depth).abs().total_cmp(&(b.depth_m - depth).abs()))
            })
            .collect()
    }

    /// Compare mixing above and below `boundary` in every quarter.
    /// Bins exactly at the boundary count as above.
    pub fn layer_contrast(&self, boundary: f64) -> Vec<LayerContrast> {
        Quarter::ALL
            .iter()
            .map(|&q| {
                let (above, below): (Vec<&ProfileBin>, Vec<&ProfileBin>) =
                    self.quarter(q).partition(|b| b.depth_m <= boundary);
                LayerContrast {
                    quarter: q,
                    boundary_depth_m: boundary,
                    above_mean: weighted_mean(&above),
                    below_mean: weighted_mean(&below),
                    above_convection_fraction: event_fraction(&above),
                    below_convection_fraction: event_fraction(&below),
                }
            })
            .collect()
    }
}

fn weighted_mean(bins: &[&ProfileBin]) -> Option<f64> {
    let (sum, n) = bins.iter().fold((0.0, 0usize), |(s, n), b| match b.mean_diffusivity {
        Some(m) => {
            let k = b.n_samples - b.n_events;
            (s + m * k as f64, n + k)
        }
        None => (s, n),
    });
    (n > 0).then(|| sum / n as f64)
}

fn event_fraction(bins: &[&ProfileBin]) -> Option<f64> {
    let total: usize = bins.iter().map(|b| b.n_samples).sum();
    let events: usize = bins.iter().map(|b| b.n_events).sum();
    (total > 0).then(|| events as f64 / total as f64)
}

#[inline]
fn depth_key(depth: f64, resolution: f64) -> i64 {
    (depth / resolution).round() as i64
}

#[derive(Default)]
struct Accum {
    depth: f64,
    n: usize,
    events: usize,
    sum: f64,
    min: f64,
    max: f64,
    area: f64,
}

/// Bin observations by (depth, quarter).
///
/// Slots with no observations are omitted and reported as
/// [`Warning::EmptyBin`]; area that grows with depth is reported as
/// [`Warning::NonMonotonicArea`] but otherwise accepted.
pub fn aggregate(
    observations: &[VerticalObservation],
    classifier: &ConvectionClassifier,
    depth_resolution_m: f64,
) -> Result<ProfileGrid> {
    if !(depth_resolution_m.is_finite() && depth_resolution_m > 0.0) {
        return Err(InputShapeError::InvalidResolution(depth_resolution_m));
    }
    validate(observations)?;

    let mut slots: BTreeMap<(Quarter, i64), Accum> = BTreeMap::new();
    let mut years: BTreeMap<(i32, Quarter), (usize, usize)> = BTreeMap::new();
    let mut depth_keys: BTreeSet<i64> = BTreeSet::new();

    for o in observations {
        let key = depth_key(o.depth, depth_resolution_m);
        depth_keys.insert(key);
        let event = classifier.classify(o);

        let acc = slots.entry((o.quarter, key)).or_insert_with(|| Accum {
            depth: o.depth,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            ..Default::default()
        });
        acc.depth = acc.depth.min(o.depth);
        acc.n += 1;
        if event {
            acc.events += 1;
        } else {
            acc.sum += o.diffusivity;
            acc.min = acc.min.min(o.diffusivity);
            acc.max = acc.max.max(o.diffusivity);
            acc.area += o.area;
        }

        let y = years.entry((o.year, o.quarter)).or_default();
        y.0 += 1;
        y.1 += usize::from(event);
    }

    let mut diagnostics = Diagnostics::new();
    let mut bins = Vec::with_capacity(slots.len());
    for q in Quarter::ALL {
        let mut last_area: Option<f64> = None;
        for &k in &depth_keys {
            let Some(acc) = slots.get(&(q, k)) else {
                diagnostics.push(Warning::EmptyBin { depth_m: k as f64 * depth_resolution_m, quarter: q });
                continue;
            };
            let normal = acc.n - acc.events;
            let bin = ProfileBin {
                depth_m: acc.depth,
                quarter: q,
                mean_diffusivity: (normal > 0).then(|| acc.sum / normal as f64),
                min_diffusivity: (normal > 0).then_some(acc.min),
                max_diffusivity: (normal > 0).then_some(acc.max),
                convection_fraction: acc.events as f64 / acc.n as f64,
                n_samples: acc.n,
                n_events: acc.events,
                sampled_area: acc.area,
            };
            if let Some(prev) = last_area {
                if bin.sampled_area > prev {
                    diagnostics.push(Warning::NonMonotonicArea { quarter: q, depth_m: bin.depth_m });
                }
            }
            last_area = Some(bin.sampled_area);
            bins.push(bin);
        }
    }

    let yearly = years
        .into_iter()
        .map(|((year, quarter), (n, e))| YearlyRate {
            year,
            quarter,
            n_samples: n,
            n_events: e,
            convection_fraction: e as f64 / n as f64,
        })
        .collect();

    log::info!(
        "aggregated {} observations into {} bins across {} depths",
        observations.len(),
        bins.len(),
        depth_keys.len()
    );

    Ok(ProfileGrid {
        threshold: classifier.threshold(),
        depth_resolution_m,
        bins,
        yearly,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn obs(depth: f64, diffusivity: f64, quarter: Quarter) -> VerticalObservation {
        VerticalObservation { depth, diffusivity, year: 2000, quarter, area: 1.0 }
    }

    fn run(o: &[VerticalObservation]) -> ProfileGrid {
        aggregate(o, &ConvectionClassifier::default(), 0.01).unwrap()
    }

    #[test]
    fn mixed_bin_splits_events_from_mean() {
        let g = run(&[obs(60.0, 0.2, Quarter::Q1), obs(60.0, 0.01, Quarter::Q1)]);
        let b = g.get(60.0, Quarter::Q1).unwrap();
        assert_relative_eq!(b.convection_fraction, 0.5);
        assert_relative_eq!(b.mean_diffusivity.unwrap(), 0.01);
        assert_eq!((b.n_samples, b.n_events), (2, 1));
    }

    #[test]
    fn mean_is_arithmetic_mean_of_normal_values() {
        let vals = [0.01, 0.03, 0.05, 0.5, 0.11];
        let o: Vec<_> = vals.iter().map(|&v| obs(10.0, v, Quarter::Q2)).collect();
        let b = run(&o).get(10.0, Quarter::Q2).cloned().unwrap();
        assert_relative_eq!(b.mean_diffusivity.unwrap(), (0.01 + 0.03 + 0.05 + 0.11) / 4.0);
        assert_eq!(b.min_diffusivity, Some(0.01));
        assert_eq!(b.max_diffusivity, Some(0.11));
        assert_relative_eq!(b.convection_fraction, 0.2);
    }

    #[test]
    fn all_flagged_bin_has_no_mean() {
        let g = run(&[obs(5.0, 0.3, Quarter::Q1), obs(5.0, 0.14, Quarter::Q1)]);
        let b = g.get(5.0, Quarter::Q1).unwrap();
        assert_eq!(b.convection_fraction, 1.0);
        assert_eq!(b.mean_diffusivity, None);
        assert_eq!(b.sampled_area, 0.0);
    }

    #[test]
    fn missing_slots_are_omitted_and_reported() {
        let g = run(&[obs(5.0, 0.01, Quarter::Q1), obs(10.0, 0.01, Quarter::Q3)]);
        assert_eq!(g.bins.len(), 2);
        assert!(g.get(5.0, Quarter::Q3).is_none());
        // Two depths × four quarters, two filled.
        let empties = g.diagnostics.iter().filter(|w| matches!(w, Warning::EmptyBin { .. })).count();
        assert_eq!(empties, 6);
    }

    #[test]
    fn non_monotonic_area_is_tolerated() {
        // Convection at the surface removes its area contribution.
        let g = run(&[
            obs(5.0, 0.5, Quarter::Q1),
            obs(5.0, 0.02, Quarter::Q1),
            obs(10.0, 0.02, Quarter::Q1),
            obs(10.0, 0.02, Quarter::Q1),
            obs(20.0, 0.02, Quarter::Q1),
        ]);
        assert_eq!(g.area_profile(Quarter::Q1), vec![(5.0, 1.0), (10.0, 2.0), (20.0, 1.0)]);
        assert!(g
            .diagnostics
            .any(|w| *w == Warning::NonMonotonicArea { quarter: Quarter::Q1, depth_m: 10.0 }));
    }

    #[test]
    fn depths_within_key_precision_share_a_bin() {
        let g = run(&[obs(0.5, 0.01, Quarter::Q4), obs(1.54, 0.02, Quarter::Q4), obs(1.541, 0.04, Quarter::Q4)]);
        assert_eq!(g.depths(), vec![0.5, 1.54]);
        assert_relative_eq!(g.get(1.54, Quarter::Q4).unwrap().mean_diffusivity.unwrap(), 0.03);
    }

    #[test]
    fn invalid_observations_are_fatal() {
        let bad = [obs(5.0, -0.1, Quarter::Q1)];
        assert!(matches!(
            aggregate(&bad, &ConvectionClassifier::default(), 0.01),
            Err(InputShapeError::InvalidObservation { field: "diffusivity", .. })
        ));
        let nan = [obs(f64::NAN, 0.1, Quarter::Q1)];
        assert!(aggregate(&nan, &ConvectionClassifier::default(), 0.01).is_err());
    }

    #[test]
    fn yearly_rates_per_quarter() {
        let mut o = vec![obs(5.0, 0.3, Quarter::Q1), obs(5.0, 0.01, Quarter::Q1)];
        o.push(VerticalObservation { year: 2001, ..obs(5.0, 0.01, Quarter::Q1) });
        let g = run(&o);
        assert_eq!(g.yearly.len(), 2);
        assert_eq!(g.yearly[0].year, 2000);
        assert_relative_eq!(g.yearly[0].convection_fraction, 0.5);
        assert_relative_eq!(g.yearly[1].convection_fraction, 0.0);
    }

    #[test]
    fn boundary_views() {
        let g = run(&[
            obs(10.0, 0.10, Quarter::Q1),
            obs(55.0, 0.08, Quarter::Q1),
            obs(65.0, 0.02, Quarter::Q1),
            obs(65.0, 0.50, Quarter::Q1),
            obs(200.0, 0.01, Quarter::Q1),
        ]);
        let at = g.at_boundary(60.0);
        assert_eq!(at.len(), 1);
        assert_eq!(at[0].depth_m, 55.0);

        let c = &g.layer_contrast(60.0)[0];
        assert_relative_eq!(c.above_mean.unwrap(), 0.09);
        assert_relative_eq!(c.below_mean.unwrap(), 0.015);
        assert_relative_eq!(c.below_convection_fraction.unwrap(), 1.0 / 3.0);
        assert_eq!(c.above_convection_fraction, Some(0.0));
        assert!(g.layer_contrast(60.0)[1].above_mean.is_none());
    }

    #[test]
    fn quarter_from_month() {
        assert_eq!(Quarter::from_month(1), Some(Quarter::Q1));
        assert_eq!(Quarter::from_month(6), Some(Quarter::Q2));
        assert_eq!(Quarter::from_month(9), Some(Quarter::Q3));
        assert_eq!(Quarter::from_month(12), Some(Quarter::Q4));
        assert_eq!(Quarter::from_month(0), None);
        assert_eq!(Quarter::from_month(13), None);
    }
}
