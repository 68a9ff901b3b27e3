use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a decorated frame.
pub trait ImageWriter: Send {
    /// Writes `frame` to `path`; the format follows the file extension.
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
