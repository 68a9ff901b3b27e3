use std::path::Path;
use std::sync::OnceLock;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_ellipse_mut, draw_filled_rect_mut, draw_hollow_ellipse_mut};
use imageproc::rect::Rect;

use crate::decoration::domain::decoration::{Decoration, DecorationError};
use crate::shared::bitmap::Bitmap;

const GLASSES_WIDTH: u32 = 256;
const GLASSES_HEIGHT: u32 = 96;

static CLASSIC_GLASSES: OnceLock<Decoration> = OnceLock::new();

/// Produces [`Decoration`]s from image files or the built-in artwork.
pub struct DecorationLoader;

impl DecorationLoader {
    /// Decodes any format the `image` crate understands into RGBA.
    pub fn load(path: &Path) -> Result<Decoration, DecorationError> {
        let img = image::open(path).map_err(|source| DecorationError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let decoration = Decoration::new(name, Bitmap::new(img.to_rgba8()))?;
        log::info!(
            "Loaded decoration {} ({}x{})",
            path.display(),
            decoration.bitmap().width(),
            decoration.bitmap().height()
        );
        Ok(decoration)
    }

    /// Loads `path` when given, otherwise the built-in glasses.
    pub fn load_or_default(path: Option<&Path>) -> Result<Decoration, DecorationError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::classic_glasses()),
        }
    }

    /// Dark round sunglasses, rendered once per process.
    pub fn classic_glasses() -> Decoration {
        CLASSIC_GLASSES
            .get_or_init(|| {
                let bitmap = Bitmap::new(draw_glasses(GLASSES_WIDTH, GLASSES_HEIGHT));
                Decoration::builtin("classic_glasses", bitmap)
            })
            .clone()
    }
}

fn draw_glasses(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    let frame = Rgba([20, 20, 20, 255]);
    let lens = Rgba([40, 40, 60, 230]);

    let w = width as i32;
    let h = height as i32;
    let rx = w * 11 / 64;
    let ry = h * 3 / 8;
    let cy = h / 2;
    let left_cx = w * 5 / 16;
    let right_cx = w - left_cx;

    for cx in [left_cx, right_cx] {
        draw_filled_ellipse_mut(&mut img, (cx, cy), rx, ry, lens);
        for d in 0..3 {
            draw_hollow_ellipse_mut(&mut img, (cx, cy), rx + d, ry + d, frame);
        }
    }

    let bar = (h / 16).max(1) as u32;
    // Bridge between the lenses.
    let bridge_x = left_cx + rx;
    let bridge_w = (right_cx - rx - bridge_x).max(1) as u32;
    draw_filled_rect_mut(
        &mut img,
        Rect::at(bridge_x, cy - ry / 2).of_size(bridge_w, bar),
        frame,
    );
    // Temples out to the image edges.
    let temple_w = (left_cx - rx).max(1) as u32;
    draw_filled_rect_mut(&mut img, Rect::at(0, cy - ry / 2).of_size(temple_w, bar), frame);
    draw_filled_rect_mut(
        &mut img,
        Rect::at(right_cx + rx, cy - ry / 2).of_size(temple_w, bar),
        frame,
    );
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_glasses_dimensions() {
        let d = DecorationLoader::classic_glasses();
        assert_eq!(d.bitmap().width(), GLASSES_WIDTH);
        assert_eq!(d.bitmap().height(), GLASSES_HEIGHT);
    }

    #[test]
    fn test_classic_glasses_cached() {
        let a = DecorationLoader::classic_glasses();
        let b = DecorationLoader::classic_glasses();
        assert!(a.shares_bitmap_with(&b));
    }

    #[test]
    fn test_classic_glasses_has_opaque_lenses_and_clear_corners() {
        let d = DecorationLoader::classic_glasses();
        let b = d.bitmap();
        let left_lens = b.pixel(GLASSES_WIDTH * 5 / 16, GLASSES_HEIGHT / 2);
        assert!(left_lens[3] > 200);
        assert_eq!(b.pixel(0, GLASSES_HEIGHT - 1)[3], 0);
    }

    #[test]
    fn test_load_png_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hat.png");
        let mut img = RgbaImage::new(8, 4);
        img.put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        img.save(&path).unwrap();

        let d = DecorationLoader::load(&path).unwrap();
        assert_eq!(d.name(), "hat");
        assert_eq!(d.bitmap().width(), 8);
        assert_eq!(d.bitmap().pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(d.bitmap().pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_load_missing_file_is_decode_error() {
        let err = DecorationLoader::load(Path::new("/nonexistent/glasses.png")).unwrap_err();
        assert!(matches!(err, DecorationError::Decode { .. }));
    }

    #[test]
    fn test_load_or_default_falls_back_to_glasses() {
        let d = DecorationLoader::load_or_default(None).unwrap();
        assert_eq!(d.name(), "classic_glasses");
    }
}
