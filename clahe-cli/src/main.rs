use anyhow::{bail, Context, Result};
use clahe_core::pipeline::{load_image, process_file};
use clahe_core::ClaheParams;
use clap::{Args, Parser, Subcommand};
use image::RgbImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::{AppConfig, ParamOverrides};

#[derive(Parser)]
#[command(
    name = "clahe",
    version,
    about = "Contrast Limited Adaptive Histogram Equalization for images"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML config file (default: nearest .clahe.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Equalization flags shared by `single` and `batch`.
#[derive(Args, Debug, Default)]
struct ParamArgs {
    /// Named preset: standard, strong, gentle, classic
    #[arg(long)]
    preset: Option<String>,

    /// Tile edge length in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    tile_length: Option<u32>,

    /// Clip factor (clip limit = tile_length^2 / clip_factor, <= 0 disables clipping)
    #[arg(long, allow_negative_numbers = true)]
    clip_factor: Option<f64>,

    /// Blend between identity (0.0) and full equalization (1.0)
    #[arg(long)]
    blend_factor: Option<f64>,

    /// Fraction of the original value mixed back into each pixel
    #[arg(long)]
    smoothing: Option<f64>,
}

impl From<ParamArgs> for ParamOverrides {
    fn from(args: ParamArgs) -> Self {
        Self {
            preset: args.preset,
            tile_length: args.tile_length,
            clip_factor: args.clip_factor,
            blend_factor: args.blend_factor,
            smoothing: args.smoothing,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Equalize a single image
    Single {
        /// Input image path
        input: PathBuf,

        /// Output image path (default: <input>_<preset>.png)
        output: Option<PathBuf>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Equalize all images in a directory
    Batch {
        /// Input directory
        input_dir: PathBuf,

        /// Output directory (default: input_dir/clahe_out)
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        params: ParamArgs,

        /// Number of parallel jobs (default: num_cpus)
        #[arg(long, short)]
        jobs: Option<usize>,

        /// Reprocess even if output is up-to-date
        #[arg(long)]
        force: bool,
    },

    /// Compare two images pixel-by-pixel
    Compare {
        /// First image
        image_a: PathBuf,

        /// Second image
        image_b: PathBuf,

        /// Save visual diff to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Outputs are named `<stem>_<preset>`; skip them when re-scanning a directory.
fn is_generated_file(path: &Path) -> bool {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    ClaheParams::preset_names()
        .iter()
        .any(|name| stem.ends_with(&format!("_{}", name)))
}

fn output_name(input: &Path, preset_name: &str) -> Result<String> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("{}: file name is not valid UTF-8", input.display()))?;
    Ok(format!("{}_{}.png", stem, preset_name))
}

fn default_output_path(input: &Path, preset_name: &str) -> Result<PathBuf> {
    let parent = input.parent().unwrap_or(Path::new("."));
    Ok(parent.join(output_name(input, preset_name)?))
}

/// True when `output` exists and is newer than `input`.
fn is_up_to_date(input: &Path, output: &Path) -> bool {
    let modified = |p: &Path| p.metadata().and_then(|m| m.modified()).ok();
    match (modified(input), modified(output)) {
        (Some(in_time), Some(out_time)) => out_time > in_time,
        _ => false,
    }
}

fn cmd_single(
    input: &Path,
    output: Option<&Path>,
    preset_name: &str,
    params: &ClaheParams,
) -> Result<()> {
    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => default_output_path(input, preset_name)?,
    };

    info!(
        "Processing: {} -> {} [{}]",
        input.display(),
        output_path.display(),
        preset_name
    );
    process_file(input, &output_path, params)
        .with_context(|| format!("failed to process {}", input.display()))?;
    info!("Done: {}", output_path.display());
    Ok(())
}

fn cmd_batch(
    input_dir: &Path,
    output_dir: &Path,
    preset_name: &str,
    params: &ClaheParams,
    jobs: Option<usize>,
    force: bool,
) -> Result<()> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .with_context(|| format!("cannot read directory {}", input_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image_file(p) && !is_generated_file(p))
        .collect();
    images.sort();

    if images.is_empty() {
        warn!("No source images found in {}", input_dir.display());
        return Ok(());
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;

    let mut pending = Vec::new();
    let mut skipped = 0usize;
    for input in images {
        let output = output_dir.join(output_name(&input, preset_name)?);
        if !force && is_up_to_date(&input, &output) {
            skipped += 1;
        } else {
            pending.push((input, output));
        }
    }

    info!(
        "To process: {} images, skipping {} up-to-date",
        pending.len(),
        skipped
    );

    let pool = {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = jobs {
            builder = builder.num_threads(n);
        }
        builder.build().context("failed to build thread pool")?
    };

    let errors: Vec<String> = pool.install(|| {
        pending
            .par_iter()
            .filter_map(|(input, output)| {
                info!("  Equalizing {} -> {}", input.display(), output.display());
                match process_file(input, output, params) {
                    Ok(()) => None,
                    Err(e) => {
                        let msg = format!("{}: {}", input.display(), e);
                        error!("  {}", msg);
                        Some(msg)
                    }
                }
            })
            .collect()
    });

    let processed = pending.len() - errors.len();
    info!(
        "Done! Processed: {}, Skipped: {}, Errors: {}",
        processed,
        skipped,
        errors.len()
    );
    if !errors.is_empty() {
        bail!("{} of {} images failed", errors.len(), pending.len());
    }
    Ok(())
}

/// Per-channel difference statistics of two equally sized RGB images.
#[derive(Debug, Clone, PartialEq)]
struct Comparison {
    total_pixels: u64,
    exact_matches: u64,
    mae: [f64; 3],
    max_error: [u8; 3],
}

fn compare_rgb(a: &RgbImage, b: &RgbImage) -> (Comparison, RgbImage) {
    let (width, height) = a.dimensions();
    let mut diff = RgbImage::new(width, height);
    let mut exact_matches = 0u64;
    let mut sum_abs = [0u64; 3];
    let mut max_error = [0u8; 3];

    for ((pa, pb), pd) in a.pixels().zip(b.pixels()).zip(diff.pixels_mut()) {
        let mut same = true;
        for c in 0..3 {
            let d = pa[c].abs_diff(pb[c]);
            same &= d == 0;
            sum_abs[c] += d as u64;
            max_error[c] = max_error[c].max(d);
            pd[c] = d.saturating_mul(4);
        }
        exact_matches += same as u64;
    }

    let total_pixels = width as u64 * height as u64;
    let mae = sum_abs.map(|s| s as f64 / total_pixels.max(1) as f64);
    (
        Comparison {
            total_pixels,
            exact_matches,
            mae,
            max_error,
        },
        diff,
    )
}

fn cmd_compare(image_a: &Path, image_b: &Path, diff_output: Option<&Path>) -> Result<()> {
    let a = load_image(image_a).with_context(|| format!("cannot open {}", image_a.display()))?;
    let b = load_image(image_b).with_context(|| format!("cannot open {}", image_b.display()))?;

    if a.width() != b.width() || a.height() != b.height() {
        bail!(
            "Images have different dimensions: {}x{} vs {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        );
    }

    let (stats, diff) = compare_rgb(&a.to_rgb8(), &b.to_rgb8());
    let match_pct = stats.exact_matches as f64 / stats.total_pixels.max(1) as f64 * 100.0;

    println!(
        "Image comparison: {} vs {}",
        image_a.display(),
        image_b.display()
    );
    println!("Dimensions: {}x{}", a.width(), a.height());
    println!("Total pixels: {}", stats.total_pixels);
    println!("Exact matches: {} ({:.2}%)", stats.exact_matches, match_pct);
    println!(
        "MAE per channel (R,G,B): {:.4}, {:.4}, {:.4}",
        stats.mae[0], stats.mae[1], stats.mae[2]
    );
    println!(
        "Max error per channel (R,G,B): {}, {}, {}",
        stats.max_error[0], stats.max_error[1], stats.max_error[2]
    );

    if let Some(out_path) = diff_output {
        diff.save(out_path)
            .with_context(|| format!("cannot save diff to {}", out_path.display()))?;
        println!("Visual diff saved to: {}", out_path.display());
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref());

    match cli.command {
        Commands::Single {
            input,
            output,
            params,
        } => {
            let (preset_name, params) = config
                .resolve(&ParamOverrides::from(params))
                .map_err(anyhow::Error::msg)?;
            cmd_single(&input, output.as_deref(), &preset_name, &params)
        }

        Commands::Batch {
            input_dir,
            output_dir,
            params,
            jobs,
            force,
        } => {
            let (preset_name, params) = config
                .resolve(&ParamOverrides::from(params))
                .map_err(anyhow::Error::msg)?;
            let output = output_dir.unwrap_or_else(|| input_dir.join("clahe_out"));
            let jobs = jobs.or(config.batch.jobs);
            let force = force || config.batch.force.unwrap_or(false);
            cmd_batch(&input_dir, &output, &preset_name, &params, jobs, force)
        }

        Commands::Compare {
            image_a,
            image_b,
            output,
        } => cmd_compare(&image_a, &image_b, output.as_deref()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
