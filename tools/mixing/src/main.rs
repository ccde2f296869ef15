//! Depth × quarter vertical mixing summary with deep-convection rates.
//!
//! Input: JSON array of `{depth, diffusivity, year, quarter, area}` records
//! (`quarter` is "Q1".."Q4"). Output: the profile grid, layer contrast at the
//! chosen boundary, and warnings.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use zonation_core::profile::LayerContrast;
use zonation_core::{analyse_profile, ProfileBin, ProfileGrid, ProfileParams, Quarter, VerticalObservation};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mixing", about = "Aggregate vertical diffusivity by depth and quarter")]
struct Args {
    /// Observations JSON file.
    #[arg(short, long)]
    input: String,

    /// ProfileParams JSON; flags below override its fields.
    #[arg(long)]
    config: Option<String>,

    /// Deep-convection diffusivity threshold.
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Candidate shallow/deep layer boundary in metres.
    #[arg(short, long)]
    boundary: Option<f64>,

    /// Output JSON path.
    #[arg(short, long, default_value = "data/profile.json")]
    output: String,

    /// Log level (error, warn, info, debug, trace); falls back to RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Serialize)]
struct ProfileReport<'a> {
    params: &'a ProfileParams,
    profile: &'a ProfileGrid,
    layer_contrast: Vec<LayerContrast>,
    /// Per quarter, the bin nearest the layer boundary.
    boundary_bins: Vec<&'a ProfileBin>,
    /// Per quarter, sampled area by depth.
    area_profile: Vec<(Quarter, Vec<(f64, f64)>)>,
}

fn cell(grid: &ProfileGrid, depth: f64, q: Quarter) -> String {
    match grid.get(depth, q) {
        Some(b) => match b.mean_diffusivity {
            Some(m) => format!("{m:.4}/{:.2}", b.convection_fraction),
            None => format!("  -   /{:.2}", b.convection_fraction),
        },
        None => String::new(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    zonation_core::logging::init(args.log_level.as_deref());

    let mut params: ProfileParams = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?
        }
        None => ProfileParams::default(),
    };
    if let Some(t) = args.threshold {
        params.convection_threshold = t;
    }
    if let Some(b) = args.boundary {
        params.boundary_depth_m = b;
    }

    let text = fs::read_to_string(&args.input).with_context(|| format!("reading {}", args.input))?;
    let observations: Vec<VerticalObservation> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", args.input))?;
    if observations.is_empty() {
        bail!("{} contains no observations", args.input);
    }

    eprintln!(
        "Aggregating {} observations (convection threshold {}) ...",
        observations.len(),
        params.convection_threshold
    );
    let grid = analyse_profile(&observations, &params).context("validating observations")?;

    // mean diffusivity / convection fraction
    eprintln!("\n{:>9} {:>13} {:>13} {:>13} {:>13}", "Depth m", "Q1", "Q2", "Q3", "Q4");
    eprintln!("{}", "-".repeat(65));
    for depth in grid.depths() {
        eprintln!(
            "{:>9.2} {:>13} {:>13} {:>13} {:>13}",
            depth,
            cell(&grid, depth, Quarter::Q1),
            cell(&grid, depth, Quarter::Q2),
            cell(&grid, depth, Quarter::Q3),
            cell(&grid, depth, Quarter::Q4),
        );
    }

    let layer_contrast = grid.layer_contrast(params.boundary_depth_m);
    eprintln!("\nLayer boundary at {} m:", params.boundary_depth_m);
    let fmt = |v: Option<f64>| v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "-".into());
    for c in &layer_contrast {
        eprintln!(
            "  {}: above {} (conv {}), below {} (conv {})",
            c.quarter,
            fmt(c.above_mean),
            fmt(c.above_convection_fraction),
            fmt(c.below_mean),
            fmt(c.below_convection_fraction)
        );
    }

    let boundary_bins = grid.at_boundary(params.boundary_depth_m);
    eprintln!("\nBins nearest {} m:", params.boundary_depth_m);
    for b in &boundary_bins {
        eprintln!(
            "  {} at {:.2} m: mean {}, range {}..{}, conv {:.2} ({} of {} samples)",
            b.quarter,
            b.depth_m,
            fmt(b.mean_diffusivity),
            fmt(b.min_diffusivity),
            fmt(b.max_diffusivity),
            b.convection_fraction,
            b.n_events,
            b.n_samples
        );
    }

    let area_profile: Vec<(Quarter, Vec<(f64, f64)>)> =
        Quarter::ALL.iter().map(|&q| (q, grid.area_profile(q))).collect();
    eprintln!("\nSampled area (non-convective), shallowest to deepest:");
    for (q, profile) in &area_profile {
        let (top, bottom) = match (profile.first(), profile.last()) {
            (Some(t), Some(b)) => (t.1, b.1),
            _ => continue,
        };
        eprintln!("  {q}: {top:.1} at surface bin, {bottom:.1} at deepest bin, {} bins", profile.len());
    }

    let warn_count = grid.diagnostics.len();
    if warn_count > 0 {
        eprintln!("{warn_count} warnings (see output file).");
    }

    let report = ProfileReport { params: &params, profile: &grid, layer_contrast, boundary_bins, area_profile };
    let out = Path::new(&args.output);
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(out, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("writing {}", out.display()))?;
    eprintln!("Wrote {}", out.display());

    Ok(())
}
