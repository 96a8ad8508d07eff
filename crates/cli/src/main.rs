//! bathygrid CLI - enhanced bathymetric surface synthesis

mod input;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use bathygrid_core::io::{write_geotiff, GeoTiffOptions};
use bathygrid_core::{GridGeometry, Raster};
use bathygrid_synthesis::{
    BinnedPointStore, MemorySink, Progress, SourcePoint, SurfaceEngine, SynthesisConfig,
    TrackingEntry,
};

use input::{parse_area, read_config, read_features, read_soundings};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "bathygrid")]
#[command(author, version, about = "Enhanced bathymetric surface synthesis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grid soundings into an elevation surface
    Synthesize {
        /// Job configuration (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Soundings, one `lon lat depth [error [flags]]` per line
        #[arg(short, long)]
        points: PathBuf,
        /// Features (JSON array)
        #[arg(short, long)]
        features: Option<PathBuf>,
        /// Area as min_lon,min_lat,max_lon,max_lat
        #[arg(short, long, allow_hyphen_values = true)]
        area: String,
        /// Output elevation GeoTIFF
        #[arg(short, long)]
        output: PathBuf,
        /// Output uncertainty GeoTIFF (needs an uncertainty mode)
        #[arg(long)]
        uncertainty_output: Option<PathBuf>,
        /// Output tracking list (JSON)
        #[arg(long)]
        tracking: Option<PathBuf>,
    },
    /// Print the grid a job would produce
    Geometry {
        /// Job configuration (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Area as min_lon,min_lat,max_lon,max_lat
        #[arg(short, long, allow_hyphen_values = true)]
        area: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

/// Progress bar driven by the engine's percent reports
struct BarProgress(ProgressBar);

impl BarProgress {
    fn new() -> Result<Self> {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")?,
        );
        pb.set_message("Synthesizing");
        Ok(Self(pb))
    }
}

impl Progress for BarProgress {
    fn report(&mut self, percent: u8) {
        self.0.set_position(u64::from(percent));
    }
}

fn write_surface(raster: &Raster<f32>, path: &Path, options: &GeoTiffOptions) -> Result<()> {
    let pb = spinner("Writing output...")?;
    write_geotiff(raster, path, options)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn write_tracking(entries: &[TrackingEntry], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), entries)
        .context("Failed to write tracking list")
}

/// Store bins sized to the grid's geodetic cells
fn point_store(points: Vec<SourcePoint>, geometry: &GridGeometry) -> Result<BinnedPointStore> {
    let bounds = geometry.geodetic_bounds();
    let bin_x = bounds.width() / geometry.cols().max(1) as f64;
    let bin_y = bounds.height() / geometry.rows().max(1) as f64;
    BinnedPointStore::from_points(points, bin_x, bin_y).context("Failed to index soundings")
}

fn print_geometry(geometry: &GridGeometry, projection: Option<&str>) {
    let (cx, cy) = geometry.cell_size();
    let b = geometry.bounds();
    let g = geometry.geodetic_bounds();
    println!("Frame: {}", projection.unwrap_or("geodetic"));
    println!(
        "Dimensions: {} x {} ({} cells)",
        geometry.cols(),
        geometry.rows(),
        geometry.cols() * geometry.rows()
    );
    println!("Cell size: {} x {}", cx, cy);
    println!("Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})", b.min_x, b.min_y, b.max_x, b.max_y);
    if geometry.is_projected() {
        println!(
            "Geodetic bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
            g.min_x, g.min_y, g.max_x, g.max_y
        );
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Geometry { config, area } => {
            let config = read_config(config.as_deref())?;
            let area = parse_area(&area)?;
            let projection = config.projection.build(&area)?;
            let name = projection.as_ref().map(|p| p.name());
            let mut engine = SurfaceEngine::new(config)?;
            if let Some(p) = projection {
                engine = engine.with_projection(p);
            }
            let geometry = engine.geometry(area).context("Invalid grid parameters")?;
            print_geometry(&geometry, name.as_deref());
        }

        Commands::Synthesize {
            config,
            points,
            features,
            area,
            output,
            uncertainty_output,
            tracking,
        } => {
            let config: SynthesisConfig = read_config(config.as_deref())?;
            let area = parse_area(&area)?;
            if uncertainty_output.is_some() && !config.wants_uncertainty() {
                warn!("Uncertainty output requested but uncertainty mode is none; skipping it");
            }

            let projection = config.projection.build(&area)?;
            let options = GeoTiffOptions {
                projected_epsg: projection.as_ref().and_then(|p| p.epsg()),
            };
            let wants_uncertainty = config.wants_uncertainty();
            let mut engine = SurfaceEngine::new(config)?;
            if let Some(p) = projection {
                info!("Projection: {}", p.name());
                engine = engine.with_projection(p);
            }
            let geometry = engine.geometry(area).context("Invalid grid parameters")?;

            let pb = spinner("Reading soundings...")?;
            let soundings = read_soundings(&points)?;
            let features = match &features {
                Some(path) => read_features(path)?,
                None => Vec::new(),
            };
            let store = point_store(soundings, &geometry)?;
            pb.finish_and_clear();
            info!("Input: {} soundings, {} features", store.len(), features.len());

            let start = Instant::now();
            let mut sink = MemorySink::new(&geometry, wants_uncertainty);
            let mut progress = BarProgress::new()?;
            let summary = engine
                .run(area, &store, &features, &mut sink, &mut progress)
                .context("Surface synthesis failed")?;
            progress.0.finish_and_clear();
            let elapsed = start.elapsed();

            let (elevation, uncertainty, entries) = sink.into_parts();
            let stats = elevation.statistics();
            write_surface(&elevation, &output, &options)?;
            if let (Some(path), Some(grid)) = (&uncertainty_output, &uncertainty) {
                write_surface(grid, path, &options)?;
                println!("Uncertainty saved to: {}", path.display());
            }
            if let Some(path) = &tracking {
                write_tracking(&entries, path)?;
                println!("Tracking list saved to: {}", path.display());
            }

            println!("Surface saved to: {}", output.display());
            println!(
                "  Grid: {} x {}, {} populated cells, {} weighted",
                summary.cols, summary.rows, summary.populated_cells, summary.weighted_cells
            );
            println!(
                "  Features: {} blended, {} tracked, {} overrides",
                summary.features_blended, summary.features_tracked, summary.tracking_entries
            );
            if let (Some(min), Some(max)) = (stats.min, stats.max) {
                println!("  Elevation: {:.3} to {:.3}", min, max);
            }
            println!("  Processing time: {:.2?}", elapsed);
        }
    }

    Ok(())
}
