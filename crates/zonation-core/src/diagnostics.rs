//! Non-fatal conditions collected alongside results.
//!
//! The partitioning is exploratory: an operator retunes thresholds after
//! looking at degenerate output, so these are returned rather than raised.

use std::fmt;

use serde::Serialize;

use crate::profile::Quarter;

/// A recoverable condition noticed while computing a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Offshore cells lie within one cell diagonal of land.
    OffshoreTouchesCoast { cells: usize, min_distance_m: f64 },
    /// Inshore zone came out empty.
    EmptyInshore,
    /// A depth band selected no cells.
    EmptyBand { shallow: f32, deep: f32 },
    /// Shallow limit is deeper than the deep limit.
    InvertedBand { shallow: f32, deep: f32 },
    /// Minimum shore distance is zero or negative, so it constrains nothing.
    NonPositiveShoreDistance { distance_m: f64 },
    /// Shallow water cut off from the coast by the offshore zone.
    UnreachableShallowCells { cells: usize },
    /// Grid cells inside the sampled extent without any sample.
    DataGap { cells: usize },
    /// A (depth, quarter) slot had no observations and was omitted.
    EmptyBin { depth_m: f64, quarter: Quarter },
    /// Sampled area increases with depth inside one quarter.
    NonMonotonicArea { quarter: Quarter, depth_m: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::OffshoreTouchesCoast { cells, min_distance_m } => write!(
                f,
                "offshore zone touches the coast: {cells} cells, nearest {min_distance_m:.0} m from land"
            ),
            Warning::EmptyInshore => write!(f, "inshore zone has zero area"),
            Warning::EmptyBand { shallow, deep } => {
                write!(f, "depth band [{shallow}, {deep}] selects no cells")
            }
            Warning::InvertedBand { shallow, deep } => {
                write!(f, "depth band [{shallow}, {deep}] is inverted (shallow limit below deep limit)")
            }
            Warning::NonPositiveShoreDistance { distance_m } => {
                write!(f, "minimum shore distance {distance_m} m does not constrain the offshore zone")
            }
            Warning::UnreachableShallowCells { cells } => {
                write!(f, "{cells} shallow cells are not connected to the coast and were excluded")
            }
            Warning::DataGap { cells } => write!(f, "{cells} grid cells have no samples"),
            Warning::EmptyBin { depth_m, quarter } => {
                write!(f, "no observations at {depth_m} m in {quarter}")
            }
            Warning::NonMonotonicArea { quarter, depth_m } => {
                write!(f, "sampled area increases with depth at {depth_m} m in {quarter}")
            }
        }
    }
}

/// Ordered collection of warnings raised by one computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and echo it to the log.
    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    /// True if any warning matches the predicate.
    pub fn any(&self, pred: impl Fn(&Warning) -> bool) -> bool {
        self.warnings.iter().any(pred)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_serialize_with_kind_tag() {
        let mut diag = Diagnostics::new();
        diag.push(Warning::DataGap { cells: 3 });
        let json = serde_json::to_string(&diag).unwrap();
        assert_eq!(json, r#"[{"kind":"data_gap","cells":3}]"#);
    }

    #[test]
    fn extend_keeps_order() {
        let mut a = Diagnostics::new();
        a.push(Warning::EmptyInshore);
        let mut b = Diagnostics::new();
        b.push(Warning::DataGap { cells: 1 });
        a.extend(b);
        let kinds: Vec<_> = a.iter().cloned().collect();
        assert_eq!(kinds, vec![Warning::EmptyInshore, Warning::DataGap { cells: 1 }]);
    }
}
