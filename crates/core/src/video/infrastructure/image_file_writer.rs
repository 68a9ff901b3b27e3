use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames to image files using the `image` crate.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        img.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let frame = Frame::filled(50, 40, [50, 100, 200], 0);
        ImageFileWriter::new().write(&path, &frame).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (50, 40));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.png");
        ImageFileWriter::new()
            .write(&path, &Frame::filled(4, 4, [0, 0, 0], 0))
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.unknownformat");
        assert!(ImageFileWriter::new()
            .write(&path, &Frame::filled(4, 4, [0, 0, 0], 0))
            .is_err());
    }
}
