mod settings;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facedeco_core::decoration::domain::decoration::Decoration;
use facedeco_core::decoration::infrastructure::decoration_loader::DecorationLoader;
use facedeco_core::detection::domain::face_detector::FaceDetector;
use facedeco_core::detection::infrastructure::face_tracker::FaceTracker;
use facedeco_core::detection::infrastructure::model_resolver;
use facedeco_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facedeco_core::detection::infrastructure::skip_frame_detector::SkipFrameDetector;
use facedeco_core::pipeline::decorate_image_use_case::DecorateImageUseCase;
use facedeco_core::pipeline::live_preview_use_case::{LivePreviewConfig, LivePreviewUseCase};
use facedeco_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facedeco_core::shared::constants::{TRACKER_MAX_LOST, YOLO_MODEL_NAME, YOLO_MODEL_URL};
use facedeco_core::video::infrastructure::image_file_reader::ImageFileReader;
use facedeco_core::video::infrastructure::image_file_writer::ImageFileWriter;
use facedeco_core::video::infrastructure::image_sequence_reader::{
    is_image_file, ImageSequenceReader,
};

use settings::{Blend, Settings, SettingsError};

/// Draws a decoration (glasses by default) on every face in an image or a
/// recorded preview stream.
#[derive(Parser, Debug)]
#[command(name = "facedeco", version)]
struct Cli {
    /// Input image, or a directory of frames replayed as a camera preview.
    input: PathBuf,

    /// Output image, or output directory for a frame sequence.
    output: PathBuf,

    /// Decoration image (PNG with alpha works best).
    #[arg(long)]
    decoration: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Run detection every Nth frame (1 = every frame).
    #[arg(long)]
    skip_frames: Option<usize>,

    /// Frame rate of an input frame sequence.
    #[arg(long)]
    fps: Option<f64>,

    /// Treat the input as a front camera: mirror the preview and overlay.
    #[arg(long)]
    front_facing: bool,

    /// How the decoration combines with the pixels beneath it.
    #[arg(long, value_enum)]
    blend: Option<Blend>,

    /// Keep the decoration's aspect ratio instead of drawing it square.
    #[arg(long)]
    preserve_aspect: bool,

    /// Rotate the decoration with the head's roll.
    #[arg(long)]
    rotate_with_face: bool,

    /// Outline each detected face.
    #[arg(long)]
    show_box: bool,

    /// Mark eyes, nose and mouth landmarks.
    #[arg(long)]
    show_landmarks: bool,

    /// Replay frame sequences at their frame rate, like a live camera.
    #[arg(long)]
    realtime: bool,

    /// Settings file (default: per-user config directory).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Store the effective options as the new defaults.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = effective_settings(&cli, stored_settings(&cli)?);
    validate(&cli, &settings)?;

    if cli.save_settings {
        let path = cli
            .settings
            .clone()
            .or_else(Settings::default_path)
            .ok_or(SettingsError::NoConfigDir)?;
        settings.save_to(&path)?;
        log::info!("Saved settings to {}", path.display());
    }

    let decoration = DecorationLoader::load_or_default(settings.decoration.as_deref())?;
    let detector = build_detector(&settings)?;

    if cli.input.is_dir() {
        run_live_preview(&cli.input, &cli.output, detector, decoration, &settings)
    } else {
        run_image(&cli.input, &cli.output, detector, decoration, &settings)
    }
}

fn stored_settings(cli: &Cli) -> Result<Settings, SettingsError> {
    if cli.save_settings {
        Settings::load_or_new(cli.settings.as_deref())
    } else {
        Settings::load(cli.settings.as_deref())
    }
}

/// Applies command-line flags on top of stored settings. Switches can only
/// turn options on.
fn effective_settings(cli: &Cli, mut settings: Settings) -> Settings {
    if let Some(path) = &cli.decoration {
        settings.decoration = Some(path.clone());
    }
    if let Some(c) = cli.confidence {
        settings.confidence = c;
    }
    if let Some(n) = cli.skip_frames {
        settings.skip_frames = n;
    }
    if let Some(fps) = cli.fps {
        settings.fps = fps;
    }
    if let Some(blend) = cli.blend {
        settings.blend = blend;
    }
    settings.front_facing |= cli.front_facing;
    settings.preserve_aspect |= cli.preserve_aspect;
    settings.rotate_with_face |= cli.rotate_with_face;
    settings.show_box |= cli.show_box;
    settings.show_landmarks |= cli.show_landmarks;
    settings.realtime |= cli.realtime;
    settings
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if cli.input.is_file() && !is_image_file(&cli.input) {
        return Err(format!("Unsupported input image: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&settings.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            settings.confidence
        )
        .into());
    }
    if settings.skip_frames < 1 {
        return Err("Skip frames must be at least 1".into());
    }
    if settings.fps <= 0.0 {
        return Err(format!("FPS must be positive, got {}", settings.fps).into());
    }
    if let Some(path) = &settings.decoration {
        if !path.exists() {
            return Err(format!("Decoration not found: {}", path.display()).into());
        }
    }
    Ok(())
}

fn build_detector(settings: &Settings) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;

    let base: Box<dyn FaceDetector> = Box::new(OnnxYoloDetector::new(
        &model_path,
        FaceTracker::new(TRACKER_MAX_LOST),
        settings.confidence,
    )?);

    if settings.skip_frames > 1 {
        Ok(Box::new(SkipFrameDetector::new(base, settings.skip_frames)?))
    } else {
        Ok(base)
    }
}

fn run_image(
    input: &Path,
    output: &Path,
    detector: Box<dyn FaceDetector>,
    decoration: Decoration,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = DecorateImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        detector,
        decoration,
        settings.style(),
        settings.facing(),
        Box::new(StdoutPipelineLogger::default()),
    );
    use_case.execute(input, output)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_live_preview(
    input: &Path,
    output_dir: &Path,
    detector: Box<dyn FaceDetector>,
    decoration: Decoration,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = LivePreviewConfig {
        facing: settings.facing(),
        style: settings.style(),
        realtime: settings.realtime,
        ..Default::default()
    };
    let use_case = LivePreviewUseCase::new(
        Box::new(ImageSequenceReader::new(Some(settings.fps))),
        Box::new(ImageFileWriter::new()),
        detector,
        decoration,
        Box::new(StdoutPipelineLogger::default()),
        config,
    );
    let report = use_case.execute(input, output_dir)?;
    log::info!(
        "Wrote {} frames to {} ({} detected, {} shown with earlier results)",
        report.frames_rendered,
        output_dir.display(),
        report.frames_detected,
        report.frames_skipped
    );
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
