use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::decoration::domain::decoration::Decoration;
use crate::decoration::domain::face_graphic::DecorationStyle;
use crate::decoration::domain::face_graphic_tracker::FaceGraphicTracker;
use crate::detection::domain::face_detector::FaceDetector;
use crate::overlay::domain::graphic_overlay::GraphicOverlay;
use crate::overlay::domain::overlay_transform::Facing;
use crate::pipeline::frame_compositor::FrameCompositor;
use crate::pipeline::pipeline_logger::{elapsed_ms, PipelineLogger};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::image_writer::ImageWriter;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Knobs for [`LivePreviewUseCase`].
pub struct LivePreviewConfig {
    pub facing: Facing,
    pub style: DecorationStyle,
    /// Pace the reader at the source frame rate, like a live camera.
    pub realtime: bool,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for LivePreviewConfig {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            style: DecorationStyle::default(),
            realtime: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// What happened during a preview run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewReport {
    pub frames_rendered: usize,
    pub frames_detected: usize,
    /// Frames the detector never saw because it was still busy.
    pub frames_skipped: usize,
}

/// Replays a recorded camera stream the way a preview screen shows it.
///
/// Layout: `reader → render (this thread) → writer`, with the render loop
/// offering each frame to a detection worker through a one-slot channel.
/// The worker updates the face graphics on the shared overlay; the render
/// loop draws whatever graphics are current onto every frame, so
/// decorations lag detection by however long the detector takes.
pub struct LivePreviewUseCase {
    reader: Box<dyn FrameSource>,
    image_writer: Box<dyn ImageWriter>,
    detector: Box<dyn FaceDetector>,
    decoration: Decoration,
    logger: Box<dyn PipelineLogger>,
    overlay: Arc<GraphicOverlay>,
    config: LivePreviewConfig,
}

impl LivePreviewUseCase {
    pub fn new(
        reader: Box<dyn FrameSource>,
        image_writer: Box<dyn ImageWriter>,
        detector: Box<dyn FaceDetector>,
        decoration: Decoration,
        logger: Box<dyn PipelineLogger>,
        config: LivePreviewConfig,
    ) -> Self {
        Self {
            reader,
            image_writer,
            detector,
            decoration,
            logger,
            overlay: Arc::new(GraphicOverlay::new()),
            config,
        }
    }

    /// The overlay the detection worker updates.
    pub fn overlay(&self) -> Arc<GraphicOverlay> {
        self.overlay.clone()
    }

    /// Renders every frame of `input_path` into `output_dir` as
    /// `frame_NNNNNN.png`.
    pub fn execute(
        self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<PreviewReport, Box<dyn std::error::Error>> {
        let Self {
            mut reader,
            image_writer,
            detector,
            decoration,
            mut logger,
            overlay,
            config,
        } = self;

        let metadata = reader.open(input_path)?;
        overlay.set_camera_info(metadata.width, metadata.height, config.facing);
        logger.info(&format!(
            "Previewing {} frames at {} fps with {}",
            metadata.total_frames,
            metadata.fps,
            decoration.name()
        ));

        let frame_interval = (config.realtime && metadata.fps > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / metadata.fps));

        let (frame_tx, frame_rx) =
            crossbeam_channel::bounded::<Result<Frame, SendError>>(DEFAULT_CHANNEL_CAPACITY);
        let (detect_tx, detect_rx) = crossbeam_channel::bounded::<Frame>(1);

        let reader_handle =
            spawn_reader(reader, frame_tx, frame_interval, config.cancelled.clone());
        let tracker = FaceGraphicTracker::new(overlay.clone(), decoration, config.style);
        let detect_handle = spawn_detector(detector, tracker, detect_rx);

        let outcome = run_render_loop(
            &frame_rx,
            &detect_tx,
            &overlay,
            &*image_writer,
            &mut *logger,
            output_dir,
            metadata.total_frames,
            &config,
        );

        // Unblock the reader if the render loop stopped early.
        drop(frame_rx);
        drop(detect_tx);

        let report = join_threads(reader_handle, detect_handle, outcome, &mut *logger)?;
        logger.metric("frames_skipped", report.frames_skipped as f64);
        logger.summary();
        Ok(report)
    }
}

pub fn frame_file_name(index: usize) -> String {
    format!("frame_{index:06}.png")
}

fn spawn_reader(
    mut reader: Box<dyn FrameSource>,
    frame_tx: Sender<Result<Frame, SendError>>,
    frame_interval: Option<Duration>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let start = Instant::now();
        for (n, frame_result) in reader.frames().enumerate() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            if let Some(interval) = frame_interval {
                let due = interval * n as u32;
                if let Some(wait) = due.checked_sub(start.elapsed()) {
                    std::thread::sleep(wait);
                }
            }
            let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(mapped).is_err() {
                break;
            }
        }
        reader.close();
    })
}

struct DetectOutcome {
    frames_detected: usize,
    durations_ms: Vec<f64>,
    faces: Vec<usize>,
}

fn spawn_detector(
    mut detector: Box<dyn FaceDetector>,
    mut tracker: FaceGraphicTracker,
    detect_rx: Receiver<Frame>,
) -> JoinHandle<Result<DetectOutcome, SendError>> {
    std::thread::spawn(move || {
        let mut outcome = DetectOutcome {
            frames_detected: 0,
            durations_ms: Vec::new(),
            faces: Vec::new(),
        };
        for frame in detect_rx {
            let t = Instant::now();
            let faces = detector
                .detect(&frame)
                .map_err(|e| -> SendError { e.to_string().into() })?;
            outcome.durations_ms.push(elapsed_ms(t));
            outcome.faces.push(faces.len());
            outcome.frames_detected += 1;
            tracker.sync(&faces);
        }
        Ok(outcome)
    })
}

struct RenderOutcome {
    frames_rendered: usize,
    frames_skipped: usize,
    error: Option<Box<dyn std::error::Error>>,
}

#[allow(clippy::too_many_arguments)]
fn run_render_loop(
    frame_rx: &Receiver<Result<Frame, SendError>>,
    detect_tx: &Sender<Frame>,
    overlay: &GraphicOverlay,
    image_writer: &dyn ImageWriter,
    logger: &mut dyn PipelineLogger,
    output_dir: &Path,
    total_frames: usize,
    config: &LivePreviewConfig,
) -> RenderOutcome {
    let mut compositor = FrameCompositor::new(config.facing);
    let mut outcome = RenderOutcome {
        frames_rendered: 0,
        frames_skipped: 0,
        error: None,
    };

    for frame_result in frame_rx {
        if config.cancelled.load(Ordering::Relaxed) {
            break;
        }
        let mut frame = match frame_result {
            Ok(frame) => frame,
            Err(e) => {
                outcome.error = Some(e.to_string().into());
                break;
            }
        };

        match detect_tx.try_send(frame.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => outcome.frames_skipped += 1,
            // The worker exited early; its error surfaces at join.
            Err(TrySendError::Disconnected(_)) => break,
        }

        let t = Instant::now();
        compositor.present(overlay, &mut frame);
        logger.timing("render", elapsed_ms(t));

        let t = Instant::now();
        let path: PathBuf = output_dir.join(frame_file_name(frame.index()));
        if let Err(e) = image_writer.write(&path, &frame) {
            outcome.error = Some(e);
            break;
        }
        logger.timing("write", elapsed_ms(t));

        outcome.frames_rendered += 1;
        logger.progress(outcome.frames_rendered, total_frames);
    }
    outcome
}

/// Joins the worker threads and coalesces the first error encountered.
fn join_threads(
    reader_handle: JoinHandle<()>,
    detect_handle: JoinHandle<Result<DetectOutcome, SendError>>,
    render: RenderOutcome,
    logger: &mut dyn PipelineLogger,
) -> Result<PreviewReport, Box<dyn std::error::Error>> {
    let mut first_error = render.error;

    if reader_handle.join().is_err() && first_error.is_none() {
        first_error = Some("Reader thread panicked".into());
    }

    let frames_detected = match detect_handle.join() {
        Ok(Ok(detect)) => {
            for ms in detect.durations_ms {
                logger.timing("detect", ms);
            }
            for n in detect.faces {
                logger.metric("faces", n as f64);
            }
            detect.frames_detected
        }
        Ok(Err(e)) => {
            first_error.get_or_insert_with(|| e.to_string().into());
            0
        }
        Err(_) => {
            first_error.get_or_insert_with(|| "Detect thread panicked".into());
            0
        }
    };

    match first_error {
        Some(e) => Err(e),
        None => Ok(PreviewReport {
            frames_rendered: render.frames_rendered,
            frames_detected,
            frames_skipped: render.frames_skipped,
        }),
    }
}
