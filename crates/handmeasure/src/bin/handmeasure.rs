//! handmeasure CLI: calibrate, inspect, re-measure, convert and replay hand annotations.

use clap::{Args, Parser, Subcommand};
use handmeasure::io::{to_mediapipe, AnnotationRecord, MeasureConfig, ScaleInfo};
use handmeasure::replay::{replay, ReplayScript};
use handmeasure::{summary, ImageSize, MarkerDetection};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "handmeasure")]
#[command(about = "Hand joint annotation documents with AprilTag scale calibration")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// JSON config file; missing keys take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Printed AprilTag edge length in cm (overrides the config).
    #[arg(long, global = true)]
    reference_size_cm: Option<f64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the scale from a JSON array of marker detections.
    Calibrate {
        /// Detections file: `[{"id": 0, "corners": [[x, y], ...]}, ...]`.
        detections: PathBuf,

        /// Write the scale info here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print a readable summary of an annotation document.
    Info {
        document: PathBuf,
    },

    /// Recalibrate from the stored markers and rebuild the measurements.
    Measure {
        document: PathBuf,

        /// Output path (defaults to rewriting the input in place).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Export the landmarks in the 21-point MediaPipe layout.
    Convert {
        document: PathBuf,

        /// Output path (defaults to `<input stem>_mediapipe.json`).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Normalization size as WIDTHxHEIGHT; otherwise read from the image.
        #[arg(long, value_parser = parse_image_size)]
        image_size: Option<ImageSize>,
    },

    /// Run a scripted annotation session and save the resulting document.
    Replay {
        script: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },
}

fn parse_image_size(raw: &str) -> Result<ImageSize, String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let size = ImageSize::new(width, height);
    if size.is_empty() {
        return Err(format!("image size {raw} is empty"));
    }
    Ok(size)
}

fn init_logging(global: &GlobalArgs) {
    let level = handmeasure::core::level_from_verbosity(global.verbose, global.quiet);
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        handmeasure::core::init_tracing(false, level);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = handmeasure::core::init_with_level(level);
    }
}

fn load_config(global: &GlobalArgs) -> CliResult<MeasureConfig> {
    let mut cfg = match &global.config {
        Some(path) => MeasureConfig::load_json(path)?,
        None => MeasureConfig::default(),
    };
    if let Some(size) = global.reference_size_cm {
        cfg.reference_size_cm = size;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.global);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let cfg = load_config(&cli.global)?;

    match cli.command {
        Commands::Calibrate { detections, out } => run_calibrate(&cfg, &detections, out.as_deref()),
        Commands::Info { document } => run_info(&cfg, &document),
        Commands::Measure { document, out } => run_measure(&cfg, &document, out.as_deref()),
        Commands::Convert {
            document,
            out,
            image_size,
        } => run_convert(&cfg, &document, out, image_size),
        Commands::Replay { script, out } => run_replay(&cfg, &script, &out),
    }
}

fn run_calibrate(cfg: &MeasureConfig, detections: &Path, out: Option<&Path>) -> CliResult<()> {
    let raw = fs::read_to_string(detections)?;
    let detections: Vec<MarkerDetection> = serde_json::from_str(&raw)?;
    let calibration = cfg.calibrator()?.calibrate(&detections)?;
    let scale = ScaleInfo {
        calibrated: calibration.is_calibrated(),
        pixels_per_cm: calibration.pixels_per_cm(),
        apriltag_size_cm: calibration.reference_size_cm(),
    };
    let json = serde_json::to_string_pretty(&scale)?;
    match out {
        Some(path) => {
            handmeasure::io::write_atomic(path, json.as_bytes())?;
            info!("wrote scale info to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_info(cfg: &MeasureConfig, document: &Path) -> CliResult<()> {
    let record = AnnotationRecord::load(document, &cfg.decode_limits())?;
    print!("{}", summary::render(&record));
    Ok(())
}

fn run_measure(cfg: &MeasureConfig, document: &Path, out: Option<&Path>) -> CliResult<()> {
    let mut record = AnnotationRecord::load(document, &cfg.decode_limits())?;
    record.recalibrate(&cfg.calibrator()?);
    let out = out.unwrap_or(document);
    record.save(out, cfg.pretty)?;
    match record.calibration.pixels_per_cm() {
        Some(ratio) => println!("{}: {ratio:.4} px/cm", out.display()),
        None => println!("{}: uncalibrated", out.display()),
    }
    Ok(())
}

fn resolve_image_size(cfg: &MeasureConfig, record: &AnnotationRecord) -> ImageSize {
    #[cfg(feature = "image")]
    {
        handmeasure::probe::image_size_or(&record.image_path, cfg.mediapipe_fallback_size)
    }
    #[cfg(not(feature = "image"))]
    {
        warn!(
            "image probing disabled; normalizing {} by {}x{}",
            record.image_path, cfg.mediapipe_fallback_size.width, cfg.mediapipe_fallback_size.height
        );
        cfg.mediapipe_fallback_size
    }
}

fn run_convert(
    cfg: &MeasureConfig,
    document: &Path,
    out: Option<PathBuf>,
    image_size: Option<ImageSize>,
) -> CliResult<()> {
    let record = AnnotationRecord::load(document, &cfg.decode_limits())?;
    let size = match image_size {
        Some(size) => size,
        None => resolve_image_size(cfg, &record),
    };
    let hand = to_mediapipe(&record.landmarks, size)?;
    let out = out.unwrap_or_else(|| {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "hand_landmarks".to_owned());
        document.with_file_name(format!("{stem}_mediapipe.json"))
    });
    hand.write_json(&out)?;
    println!(
        "{}: {} landmarks ({}x{})",
        out.display(),
        hand.hand_landmarks.len(),
        size.width,
        size.height
    );
    Ok(())
}

#[cfg_attr(not(feature = "image"), allow(unused_mut))]
fn run_replay(cfg: &MeasureConfig, script: &Path, out: &Path) -> CliResult<()> {
    let mut script = ReplayScript::load_json(script)?;
    #[cfg(feature = "image")]
    if script.image_size.is_none() {
        script.image_size = Some(handmeasure::probe::image_size(&script.image_path)?);
    }
    let outcome = replay(&script, &cfg.calibrator()?)?;
    for r in &outcome.rejected {
        warn!("event {} ({:?}) rejected: {}", r.index, r.event, r.reason);
    }
    outcome.record.save(out, cfg.pretty)?;
    let incomplete: Vec<&str> = outcome
        .record
        .landmarks
        .incomplete_segments()
        .into_iter()
        .map(|s| s.as_str())
        .collect();
    if !incomplete.is_empty() {
        warn!("saved with incomplete segments: {}", incomplete.join(", "));
    }
    println!(
        "{}: {} points, {} rejected event(s)",
        out.display(),
        outcome.record.landmarks.total(),
        outcome.rejected.len()
    );
    Ok(())
}
