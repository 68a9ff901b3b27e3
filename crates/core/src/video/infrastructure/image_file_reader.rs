use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::source_metadata::SourceMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Adapts a single image file to the [`FrameSource`] interface.
///
/// The image is a one-frame source with `fps=0` and `total_frames=1`, so
/// stills and preview streams share one pipeline shape.
pub struct ImageFileReader {
    frame: Option<Frame>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes an image file into an RGB frame with the given index.
pub fn decode_frame(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, index))
}

impl FrameSource for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
        let frame = decode_frame(path, 0)?;
        let metadata = SourceMetadata {
            width: frame.width(),
            height: frame.height(),
            fps: 0.0,
            total_frames: 1,
            source_path: Some(path.to_path_buf()),
        };
        self.frame = Some(frame);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.frame.is_none() {
            return Box::new(std::iter::once(Err("ImageFileReader: not opened".into())));
        }
        Box::new(self.frame.take().into_iter().map(Ok))
    }

    fn close(&mut self) {
        self.frame = None;
    }
}
