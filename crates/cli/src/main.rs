//! covermap CLI - Land-cover mapping from optical and radar composites

mod config;
mod stages;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use config::PipelineConfig;
use covermap_colormap::{VisParams, classes_to_rgba, legend_table, stretch_rgb};
use covermap_core::Raster;
use covermap_core::io::{AssetStore, read_geotiff, write_rgba_geotiff};
use stages::{Pipeline, spinner};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "covermap")]
#[command(author, version, about = "Land-cover mapping from Landsat and PALSAR composites", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pipeline config (JSON); built-in Northern Negros defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Print the effective configuration as JSON
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build the cloud-masked median optical composite of one epoch
    Optical {
        #[arg(short, long)]
        year: i32,
    },
    /// Build the calibrated radar composite of one epoch
    Radar {
        #[arg(short, long)]
        year: i32,
    },
    /// Train, evaluate and export the land-cover map of one epoch
    Classify {
        #[arg(short, long)]
        year: i32,
    },
    /// Every composite and every classification
    Run,
    /// Print the land-cover legend
    Legend,
    /// Render an RGBA quicklook of a class map or a stored composite
    Quicklook {
        /// Class map GeoTIFF, or a composite directory in the asset store
        input: PathBuf,
        /// Output RGBA GeoTIFF
        output: PathBuf,
        /// Stretch for composites; class maps use the legend colours
        #[arg(short, long)]
        preset: Option<Preset>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Landsat,
    Palsar,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_info(input: &Path) -> Result<()> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(input).context("Failed to read raster")?;
    pb.finish_and_clear();

    let (rows, cols) = raster.shape();
    let bounds = raster.bounds();
    let stats = raster.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!("Cell size: {}", raster.cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    if let Some(crs) = raster.crs() {
        println!("CRS: {}", crs);
    }
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
    );
    Ok(())
}

fn quicklook(input: &Path, output: &Path, preset: Option<Preset>) -> Result<()> {
    let Some(preset) = preset else {
        let map: Raster<u8> = read_geotiff(input).context("Failed to read class map")?;
        let (rows, cols) = map.shape();
        write_rgba_geotiff(&classes_to_rgba(&map), rows, cols, map.transform(), map.crs(), output)?;
        return Ok(());
    };

    let (Some(root), Some(name)) = (input.parent(), input.file_name().and_then(|n| n.to_str())) else {
        bail!("Not a composite directory: {}", input.display());
    };
    let stack = AssetStore::new(root)
        .read(name)
        .with_context(|| format!("Failed to read composite {}", input.display()))?;
    let vis = match preset {
        Preset::Landsat => VisParams::landsat(),
        Preset::Palsar => VisParams::palsar(),
    };
    let (rows, cols) = stack.shape();
    write_rgba_geotiff(&stretch_rgb(&stack, &vis)?, rows, cols, &stack.transform(), stack.crs(), output)?;
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = PipelineConfig::load(cli.config.as_deref())?;
    let pipeline = Pipeline::new(&config);

    match cli.command {
        Commands::Info { input } => print_info(&input)?,
        Commands::Config { output } => {
            let json = config.to_json()?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Config written to: {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Optical { year } => {
            let start = Instant::now();
            let dir = pipeline.build_optical(year)?;
            done("Optical composite", &dir, start.elapsed());
        }
        Commands::Radar { year } => {
            let start = Instant::now();
            let dir = pipeline.build_radar(year)?;
            done("Radar composite", &dir, start.elapsed());
        }
        Commands::Classify { year } => {
            let start = Instant::now();
            let out = pipeline.classify(year)?;
            println!("Accuracy report: {}", out.accuracy.display());
            println!("Model: {}", out.model.display());
            done("Land-cover map", &out.map, start.elapsed());
        }
        Commands::Run => {
            let start = Instant::now();
            info!("Site {}, years {:?}", config.site, config.years());
            let outputs = pipeline.run()?;
            println!();
            for out in &outputs {
                println!(
                    "{}: {} (OA {:.4})",
                    out.year,
                    out.map.display(),
                    out.report.overall_accuracy
                );
            }
            println!("  Processing time: {:.2?}", start.elapsed());
        }
        Commands::Legend => print!("{}", legend_table()),
        Commands::Quicklook { input, output, preset } => {
            let start = Instant::now();
            quicklook(&input, &output, preset)?;
            done("Quicklook", &output, start.elapsed());
        }
    }

    Ok(())
}
