use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::source_metadata::SourceMetadata;

/// Supplies frames from a still image or a recorded preview stream.
///
/// Pipelines see only `Frame` and `SourceMetadata`; decoding and file
/// layout are the implementation's business.
pub trait FrameSource: Send {
    /// Opens the source and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in presentation order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
