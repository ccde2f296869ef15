//! Inshore/offshore zone polygons from bathymetry and coastline.
//!
//! Inputs are JSON: soundings as `[{"lon", "lat", "elevation"}, ...]` and
//! land polygons as an array of exterior rings `[[[lon, lat], ...], ...]`.
//! Output: zones/{inshore,offshore} geometry plus warnings and, when
//! requested, a depth-band sweep.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zonation_core::projection::{Identity, LocalProjection};
use zonation_core::{
    BandCandidate, Coastline, DepthSample, DomainPartitioner, GridStats, Warning, ZonePolygon,
    ZoningParams,
};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "zones", about = "Partition a bathymetry grid into inshore and offshore zones")]
struct Args {
    /// Bathymetry JSON (array of {lon, lat, elevation}).
    #[arg(short, long)]
    bathymetry: String,

    /// Coastline JSON (array of [lon, lat] rings).
    #[arg(short, long)]
    coastline: String,

    /// ZoningParams JSON; flags below override its fields.
    #[arg(long)]
    config: Option<String>,

    /// Offshore shallow limit as a positive depth in metres.
    #[arg(long)]
    shallow_depth: Option<f32>,

    /// Offshore deep limit as a positive depth in metres.
    #[arg(long)]
    deep_depth: Option<f32>,

    /// Minimum offshore distance from land in km.
    #[arg(long)]
    min_distance_km: Option<f64>,

    /// Grid resolution in metres (inferred from sample spacing if omitted).
    #[arg(long)]
    resolution: Option<f64>,

    /// Inputs are already projected metres; lon is read as x, lat as y.
    #[arg(long)]
    projected: bool,

    /// Comma-separated shallow depths (positive metres) for a band sweep.
    #[arg(long, value_delimiter = ',')]
    sweep_shallow: Vec<f32>,

    /// Comma-separated deep depths (positive metres) for a band sweep.
    #[arg(long, value_delimiter = ',')]
    sweep_deep: Vec<f32>,

    /// Output JSON path.
    #[arg(short, long, default_value = "data/zones.json")]
    output: String,

    /// Log level (error, warn, info, debug, trace); falls back to RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ZonesReport<'a> {
    params: &'a ZoningParams,
    projection: Option<LocalProjection>,
    grid: GridStats,
    inshore: &'a ZonePolygon,
    offshore: &'a ZonePolygon,
    unreachable_cells: usize,
    warnings: Vec<&'a Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sweep: Option<Vec<BandCandidate>>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn load_params(args: &Args) -> Result<ZoningParams> {
    let mut params: ZoningParams = match &args.config {
        Some(path) => read_json(path)?,
        None => ZoningParams::default(),
    };
    if let Some(d) = args.shallow_depth {
        params.shallow_limit = -d.abs();
    }
    if let Some(d) = args.deep_depth {
        params.deep_limit = -d.abs();
    }
    if let Some(km) = args.min_distance_km {
        params.min_shore_distance_m = km * 1_000.0;
    }
    if args.resolution.is_some() {
        params.resolution_m = args.resolution;
    }
    Ok(params)
}

fn print_zone(z: &ZonePolygon) {
    let range = z
        .elevation_range
        .map(|(hi, lo)| format!("{hi:.0}..{lo:.0}"))
        .unwrap_or_else(|| "-".into());
    let dist = z
        .mean_shore_distance_m
        .map(|d| format!("{:.1}", d / 1_000.0))
        .unwrap_or_else(|| "-".into());
    eprintln!(
        "{:<10} {:>8} {:>12.1} {:>14} {:>12}",
        z.zone.to_string(),
        z.cell_count,
        z.area_m2 / 1e6,
        range,
        dist
    );
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    zonation_core::logging::init(args.log_level.as_deref());

    if args.sweep_shallow.is_empty() != args.sweep_deep.is_empty() {
        bail!("--sweep-shallow and --sweep-deep must be given together");
    }

    let params = load_params(&args)?;
    let samples: Vec<DepthSample> = read_json(&args.bathymetry)?;
    let rings: Vec<Vec<(f64, f64)>> = read_json(&args.coastline)?;
    let coastline = Coastline::from_rings(rings).context("validating coastline")?;

    eprintln!("Partitioning {} soundings against {} coastline features ...", samples.len(), coastline.len());

    let partitioner = DomainPartitioner::new(params.clone());
    let result = if args.projected {
        partitioner.run_with(&samples, &coastline, &Identity)
    } else {
        partitioner.run(&samples, &coastline)
    }
    .context("validating bathymetry")?;

    let sweep = (!args.sweep_shallow.is_empty()).then(|| {
        let shallow: Vec<f32> = args.sweep_shallow.iter().map(|d| -d.abs()).collect();
        let deep: Vec<f32> = args.sweep_deep.iter().map(|d| -d.abs()).collect();
        let (candidates, diag) = result.sweep(&shallow, &deep);
        eprintln!("\n{:>8} {:>8} {:>8} {:>12}", "Shallow", "Deep", "Cells", "Area km2");
        eprintln!("{}", "-".repeat(39));
        for c in &candidates {
            eprintln!(
                "{:>8.0} {:>8.0} {:>8} {:>12.1}",
                c.band.shallow, c.band.deep, c.cell_count, c.area_m2 / 1e6
            );
        }
        if !diag.is_empty() {
            eprintln!("{} sweep combinations produced warnings.", diag.len());
        }
        candidates
    });

    let part = &result.partition;
    eprintln!(
        "\n{:<10} {:>8} {:>12} {:>14} {:>12}",
        "Zone", "Cells", "Area km2", "Elev m", "Shore km"
    );
    eprintln!("{}", "-".repeat(60));
    print_zone(&part.inshore);
    print_zone(&part.offshore);

    for w in result.diagnostics.iter() {
        eprintln!("Warning: {w}");
    }

    let report = ZonesReport {
        params: &params,
        projection: result.projection,
        grid: result.grid.stats(),
        inshore: &part.inshore,
        offshore: &part.offshore,
        unreachable_cells: part.unreachable_cells,
        warnings: result.diagnostics.iter().collect(),
        sweep,
    };

    let out = Path::new(&args.output);
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(out, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("writing {}", out.display()))?;
    eprintln!("\nWrote {}", out.display());

    Ok(())
}
