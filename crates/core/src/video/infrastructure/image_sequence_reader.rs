use std::path::{Path, PathBuf};

use crate::shared::constants::{DEFAULT_SEQUENCE_FPS, IMAGE_EXTENSIONS};
use crate::shared::frame::Frame;
use crate::shared::source_metadata::SourceMetadata;
use crate::video::domain::frame_source::FrameSource;

use super::image_file_reader::decode_frame;

/// Treats a directory of images, sorted by file name, as a recorded
/// camera preview.
///
/// Frames are decoded lazily. Every frame must match the size of the first
/// one; a mismatch is reported as an error for that frame.
pub struct ImageSequenceReader {
    fps: f64,
    paths: Vec<PathBuf>,
    size: Option<(u32, u32)>,
}

impl ImageSequenceReader {
    pub fn new(fps: Option<f64>) -> Self {
        Self {
            fps: fps.filter(|f| *f > 0.0).unwrap_or(DEFAULT_SEQUENCE_FPS),
            paths: Vec::new(),
            size: None,
        }
    }
}

impl Default for ImageSequenceReader {
    fn default() -> Self {
        Self::new(None)
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn decode_sized(
    path: &Path,
    index: usize,
    (width, height): (u32, u32),
) -> Result<Frame, Box<dyn std::error::Error>> {
    let frame = decode_frame(path, index)?;
    if (frame.width(), frame.height()) != (width, height) {
        return Err(format!(
            "{} is {}x{}, expected {width}x{height}",
            path.display(),
            frame.width(),
            frame.height()
        )
        .into());
    }
    Ok(frame)
}

impl FrameSource for ImageSequenceReader {
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
        let paths = list_images(path)?;
        let first = paths
            .first()
            .ok_or_else(|| format!("No images found in {}", path.display()))?;
        let (width, height) = image::image_dimensions(first)?;

        log::info!(
            "Opened sequence {} ({} frames, {width}x{height} @ {} fps)",
            path.display(),
            paths.len(),
            self.fps
        );

        let metadata = SourceMetadata {
            width,
            height,
            fps: self.fps,
            total_frames: paths.len(),
            source_path: Some(path.to_path_buf()),
        };
        self.paths = paths;
        self.size = Some((width, height));
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some((width, height)) = self.size else {
            return Box::new(std::iter::once(Err(
                "ImageSequenceReader: not opened".into()
            )));
        };
        let paths = std::mem::take(&mut self.paths);
        Box::new(paths.into_iter().enumerate().map(move |(index, path)| {
            decode_sized(&path, index, (width, height))
        }))
    }

    fn close(&mut self) {
        self.paths.clear();
        self.size = None;
    }
}
