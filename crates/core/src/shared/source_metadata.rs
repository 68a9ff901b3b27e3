use std::path::PathBuf;

/// Describes a frame source: a still image or a recorded preview stream.
///
/// Still images are a one-frame source with `fps == 0.0`.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl SourceMetadata {
    pub fn is_still(&self) -> bool {
        self.total_frames == 1 && self.fps == 0.0
    }
}
