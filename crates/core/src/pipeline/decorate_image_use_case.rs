use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::decoration::domain::decoration::Decoration;
use crate::decoration::domain::face_graphic::DecorationStyle;
use crate::decoration::domain::face_graphic_tracker::FaceGraphicTracker;
use crate::detection::domain::face_detector::FaceDetector;
use crate::overlay::domain::graphic_overlay::GraphicOverlay;
use crate::overlay::domain::overlay_transform::Facing;
use crate::pipeline::frame_compositor::FrameCompositor;
use crate::pipeline::pipeline_logger::{elapsed_ms, PipelineLogger};
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::image_writer::ImageWriter;

/// Single-image pipeline: read → detect → place graphics → composite → write.
pub struct DecorateImageUseCase {
    reader: Box<dyn FrameSource>,
    image_writer: Box<dyn ImageWriter>,
    detector: Box<dyn FaceDetector>,
    decoration: Decoration,
    style: DecorationStyle,
    facing: Facing,
    logger: Box<dyn PipelineLogger>,
}

impl DecorateImageUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn FrameSource>,
        image_writer: Box<dyn ImageWriter>,
        detector: Box<dyn FaceDetector>,
        decoration: Decoration,
        style: DecorationStyle,
        facing: Facing,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            image_writer,
            detector,
            decoration,
            style,
            facing,
            logger,
        }
    }

    /// Decorates every face found in `input_path` and writes the result.
    /// Returns the number of faces decorated.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(input_path)?;
        let mut frame = self.reader.frames().next().ok_or("No frames in image")??;
        self.reader.close();

        let t = Instant::now();
        let faces = self.detector.detect(&frame)?;
        self.logger.timing("detect", elapsed_ms(t));
        self.logger.metric("faces", faces.len() as f64);

        let overlay = Arc::new(GraphicOverlay::new());
        overlay.set_camera_info(metadata.width, metadata.height, self.facing);
        let mut tracker =
            FaceGraphicTracker::new(overlay.clone(), self.decoration.clone(), self.style);
        tracker.sync(&faces);

        let t = Instant::now();
        FrameCompositor::new(self.facing).present(&overlay, &mut frame);
        self.logger.timing("render", elapsed_ms(t));

        let t = Instant::now();
        self.image_writer.write(output_path, &frame)?;
        self.logger.timing("write", elapsed_ms(t));

        self.logger.progress(1, 1);
        self.logger.info(&format!(
            "Decorated {} face(s) with {}",
            faces.len(),
            self.decoration.name()
        ));
        self.logger.summary();
        Ok(faces.len())
    }
}
