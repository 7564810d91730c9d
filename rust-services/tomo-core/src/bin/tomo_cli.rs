use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use tomo_core::io::{
    load_grayscale, save_grayscale_png, write_reconstruction_npz, RunReport, StudyMetadata,
};
use tomo_core::{ScanConfig, Tomograph};

/// Simulate a CT scan of an image and reconstruct it by backprojection.
///
/// Writes into the output directory:
///   - reconstruction.npz: sinograms, reconstructions and progress snapshots
///   - sinogram.png, reconstruction.png (filtered variants with --filter)
///   - progress_<i>.png for every snapshot, with --snapshots
///   - report.json: geometry summary and optional study metadata
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input picture (PNG, JPEG, ...) or 2-D f64 .npy array
    #[arg(long)]
    input: PathBuf,

    /// Directory receiving all outputs
    #[arg(long)]
    output_dir: PathBuf,

    /// JSON scan configuration; explicit flags below take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rotation between views, in degrees
    #[arg(long)]
    step: Option<f64>,

    /// Number of detectors per view
    #[arg(long)]
    detectors: Option<usize>,

    /// Fan spread between first and last detector, in degrees
    #[arg(long)]
    bandwidth: Option<f64>,

    /// Render the ramp-filtered sinogram and reconstruction
    #[arg(long)]
    filter: bool,

    /// Also render every progress snapshot
    #[arg(long)]
    snapshots: bool,

    /// Crop rendered reconstructions back to the input image region
    #[arg(long)]
    crop: bool,

    #[arg(long)]
    patient_name: Option<String>,

    #[arg(long)]
    patient_id: Option<String>,

    #[arg(long)]
    comments: Option<String>,

    /// Free-form study date, e.g. 2024-03-01
    #[arg(long)]
    study_date: Option<String>,
}

impl Args {
    fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)?,
            None => ScanConfig::default(),
        };
        if let Some(step) = self.step {
            config.step = step;
        }
        if let Some(detectors) = self.detectors {
            config.detectors = detectors;
        }
        if let Some(bandwidth) = self.bandwidth {
            config.bandwidth = bandwidth;
        }
        Ok(config)
    }

    fn study(&self) -> StudyMetadata {
        StudyMetadata {
            patient_name: self.patient_name.clone(),
            patient_id: self.patient_id.clone(),
            comments: self.comments.clone(),
            study_date: self.study_date.clone(),
        }
    }
}

fn setup_logging() -> Result<LoggerHandle> {
    Logger::try_with_env_or_str("info")
        .map_err(|e| anyhow::anyhow!("Invalid log specification: {}", e))?
        .log_to_stderr()
        .start()
        .map_err(|e| anyhow::anyhow!("Logger initialization failed: {}", e))
}

fn main() -> Result<()> {
    let _logger = setup_logging()?;
    let args = Args::parse();
    let config = args.scan_config()?;

    // --- Load input image ---
    let image = load_grayscale(&args.input)
        .map_err(|e| anyhow::anyhow!("Failed to load input {:?}: {}", args.input, e))?;
    let (h, w) = image.dim();

    let mut tomograph = Tomograph::new(&image.view(), config)
        .map_err(|e| anyhow::anyhow!("Cannot scan {:?}: {}", args.input, e))?;

    info!(
        "Scanning {}x{} image: step = {}, detectors = {}, bandwidth = {}",
        h, w, config.step, config.detectors, config.bandwidth
    );

    // --- Sweep, with a progress bar over views ---
    let views = tomograph.geometry().views() as u64;
    let bar = ProgressBar::new(views);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {wide_bar} {pos}/{len} views ({eta_precise})")
            .map_err(|e| anyhow::anyhow!("Bad progress template: {}", e))?,
    );
    let start = Instant::now();
    tomograph.process_with_progress(|done, _| bar.set_position(done as u64));
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    bar.finish_and_clear();

    let reconstruction = tomograph
        .reconstruction()
        .ok_or_else(|| anyhow::anyhow!("Sweep produced no reconstruction"))?;
    let padded = tomograph.padded_image();
    let out = &args.output_dir;

    // --- Persist arrays and rendered images ---
    write_reconstruction_npz(reconstruction, &out.join("reconstruction.npz"))?;
    save_grayscale_png(
        &reconstruction.sinogram_for(args.filter).view(),
        &out.join("sinogram.png"),
    )?;

    let render = |grid: &ndarray::Array2<f64>, name: String| -> Result<()> {
        let view = if args.crop { padded.crop(grid) } else { grid.view() };
        save_grayscale_png(&view, &out.join(name))?;
        Ok(())
    };
    render(reconstruction.result_for(args.filter), "reconstruction.png".into())?;
    if args.snapshots {
        for i in 0..reconstruction.snapshot_count() {
            if let Some(snapshot) = reconstruction.progress(i, args.filter) {
                render(snapshot, format!("progress_{i}.png"))?;
            }
        }
    }

    RunReport::new(&tomograph, elapsed_ms, args.study()).write(&out.join("report.json"))?;

    info!("Reconstruction written to {:?} in {:.1} ms", out, elapsed_ms);

    Ok(())
}
