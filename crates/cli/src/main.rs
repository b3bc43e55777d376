use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use cellcount_core::detection::infrastructure::canny_blob_detector::CannyBlobDetector;
use cellcount_core::export::csv_exporter::{write_history, write_results, write_trajectories};
use cellcount_core::overlay::domain::overlay_sink::OverlaySink;
use cellcount_core::overlay::infrastructure::png_overlay_writer::PngOverlayWriter;
use cellcount_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use cellcount_core::pipeline::track_sequence_use_case::{SequenceConfig, TrackSequenceUseCase};
use cellcount_core::preprocessing::domain::background_model::BackgroundMethod;
use cellcount_core::preprocessing::domain::frame_preprocessor::FramePreprocessor;
use cellcount_core::preprocessing::infrastructure::background_model_factory::create_background_model;
use cellcount_core::shared::tracking_config::TrackingConfig;
use cellcount_core::tracking::domain::registry_config::{ExpiryPolicy, MatchingStrategy};
use cellcount_core::video::domain::frame_source::FrameSource;
#[cfg(feature = "ffmpeg")]
use cellcount_core::video::infrastructure::ffmpeg_reader::FfmpegFrameSource;
use cellcount_core::video::infrastructure::image_sequence_reader::ImageSequenceReader;

/// Count and track particles in microscope image sequences.
#[derive(Parser)]
#[command(name = "cellcount")]
struct Cli {
    /// Directories of frames (or video files with the ffmpeg feature).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Settings file to start from (default: user config dir).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings to this file.
    #[arg(long)]
    save_settings: Option<PathBuf>,

    /// Canny lower hysteresis threshold.
    #[arg(long)]
    canny_lower: Option<u32>,

    /// Canny upper hysteresis threshold.
    #[arg(long)]
    canny_upper: Option<u32>,

    /// Max distance (px) between matched centers in consecutive matches.
    #[arg(long)]
    max_centroid_distance: Option<u32>,

    /// Frames a track may go unmatched before it expires.
    #[arg(long)]
    timeout: Option<u32>,

    /// Merge padding (px); blobs above 10x this are rejected.
    #[arg(long)]
    cell_radius: Option<u32>,

    /// Directory for result files.
    #[arg(long)]
    csv_save_path: Option<PathBuf>,

    /// Association strategy: greedy or optimal.
    #[arg(long)]
    matching: Option<String>,

    /// Background model: mog2 or first_frame.
    #[arg(long)]
    background: Option<String>,

    /// Discard tracks expiring with fewer than N matches.
    #[arg(long, value_name = "N")]
    drop_unconfirmed: Option<u32>,

    /// Frames per processing batch.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Write annotated PNG frames next to the results.
    #[arg(long)]
    save_overlay: bool,

    /// Also write per-frame trajectories.
    #[arg(long)]
    trajectories: bool,

    /// Also write the per-detection assignment log.
    #[arg(long)]
    record_history: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    config.validate()?;
    if let Some(path) = &cli.save_settings {
        config.save(path)?;
        log::info!("Settings written to {}", path.display());
    }

    let mut failed = 0;
    for input in &cli.inputs {
        if let Err(e) = run_input(input, &config, cli.trajectories) {
            log::error!("{}: {e}", input.display());
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} inputs failed", cli.inputs.len()).into());
    }
    Ok(())
}

fn run_input(
    input: &Path,
    config: &TrackingConfig,
    trajectories: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = open_source(input)?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sequence")
        .to_string();
    log::info!("{stem}: {} frames", source.len());

    let overlay: Option<Box<dyn OverlaySink>> = if config.save_overlay {
        let dir = config.csv_save_path.join(format!("{stem}_overlay"));
        Some(Box::new(PngOverlayWriter::new(dir)))
    } else {
        None
    };

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rProcessing frame {current}/{total}");
        true
    });

    let mut use_case = TrackSequenceUseCase::new(
        source,
        FramePreprocessor::new(create_background_model(config.background)),
        Box::new(CannyBlobDetector::new(config.detector_config())),
        overlay,
        Box::new(StdoutPipelineLogger::default().without_progress()),
        SequenceConfig {
            registry: config.registry_config(),
            batch_size: config.batch_size,
            record_history: config.record_history,
            on_progress: Some(progress),
            ..SequenceConfig::default()
        },
    );
    let result = use_case.execute()?;
    eprintln!();

    let results_path = config.csv_save_path.join(format!("{stem}_results.csv"));
    let summary = write_results(&results_path, &result.objects)?;
    log::info!(
        "{stem}: {} cells counted, DEP True {}, DEP False {}",
        summary.counted,
        summary.responsive,
        summary.non_responsive
    );
    log::info!("Results written to {}", results_path.display());

    if trajectories {
        let path = config.csv_save_path.join(format!("{stem}_trajectories.csv"));
        let rows = write_trajectories(&path, &result.objects)?;
        log::info!("{rows} trajectory points written to {}", path.display());
    }
    if config.record_history {
        let path = config.csv_save_path.join(format!("{stem}_history.csv"));
        let rows = write_history(&path, &result.history)?;
        log::info!("{rows} assignments written to {}", path.display());
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<TrackingConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.settings {
        Some(path) => TrackingConfig::load(path)?,
        None => match TrackingConfig::default_path() {
            Some(path) => TrackingConfig::load_or_default(&path)?,
            None => TrackingConfig::default(),
        },
    };
    apply_overrides(cli, &mut config);
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut TrackingConfig) {
    if let Some(v) = cli.canny_lower {
        config.canny_lower = v;
    }
    if let Some(v) = cli.canny_upper {
        config.canny_upper = v;
    }
    if let Some(v) = cli.max_centroid_distance {
        config.max_centroid_distance = v;
    }
    if let Some(v) = cli.timeout {
        config.timeout = v;
    }
    if let Some(v) = cli.cell_radius {
        config.cell_radius = v;
    }
    if let Some(path) = &cli.csv_save_path {
        config.csv_save_path = path.clone();
    }
    if let Some(m) = &cli.matching {
        config.matching = parse_matching(m);
    }
    if let Some(b) = &cli.background {
        config.background = parse_background(b);
    }
    if let Some(n) = cli.drop_unconfirmed {
        config.expiry = ExpiryPolicy::DropUnconfirmed {
            min_frames_tracked: n,
        };
    }
    if let Some(v) = cli.batch_size {
        config.batch_size = v;
    }
    config.save_overlay |= cli.save_overlay;
    config.record_history |= cli.record_history;
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }
    if let Some(m) = &cli.matching {
        if m != "greedy" && m != "optimal" {
            return Err(format!("Matching must be 'greedy' or 'optimal', got '{m}'").into());
        }
    }
    if let Some(b) = &cli.background {
        if b != "mog2" && b != "first_frame" {
            return Err(format!("Background must be 'mog2' or 'first_frame', got '{b}'").into());
        }
    }
    Ok(())
}

fn open_source(input: &Path) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    if input.is_dir() {
        return Ok(Box::new(ImageSequenceReader::open(input)?));
    }
    open_video(input)
}

#[cfg(feature = "ffmpeg")]
fn open_video(input: &Path) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    Ok(Box::new(FfmpegFrameSource::open(input)?))
}

#[cfg(not(feature = "ffmpeg"))]
fn open_video(input: &Path) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    Err(format!(
        "{} is not a directory; video input needs the ffmpeg feature",
        input.display()
    )
    .into())
}

fn parse_matching(matching: &str) -> MatchingStrategy {
    if matching == "optimal" {
        MatchingStrategy::Optimal
    } else {
        MatchingStrategy::Greedy
    }
}

fn parse_background(background: &str) -> BackgroundMethod {
    if background == "first_frame" {
        BackgroundMethod::FirstFrame
    } else {
        BackgroundMethod::Mog2
    }
}
