use crate::shared::face::Face;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Implementations may be stateful (e.g., tracking across frames),
/// hence `&mut self`. Returned faces carry stable track ids.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>>;
}
