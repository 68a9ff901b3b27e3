use image::imageops::FilterType;
use image::{Rgba, RgbaImage};

/// An immutable RGBA raster, e.g. a decoration sprite.
///
/// Transformations return new bitmaps; the source is never mutated so a
/// single instance can be shared across threads behind an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pixels: RgbaImage,
}

impl Bitmap {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// A fully transparent bitmap.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::new(RgbaImage::new(width, height))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Resizes to exactly `width` x `height`, sampling the nearest source
    /// pixel so no new colours are introduced.
    pub fn scaled(&self, width: u32, height: u32) -> Bitmap {
        if width == self.width() && height == self.height() {
            return self.clone();
        }
        Bitmap::new(image::imageops::resize(
            &self.pixels,
            width,
            height,
            FilterType::Nearest,
        ))
    }

    /// Rotates clockwise by `degrees` about the centre, keeping dimensions.
    /// Uncovered corners become transparent.
    pub fn rotated(&self, degrees: f64) -> Bitmap {
        if degrees == 0.0 || self.is_empty() {
            return self.clone();
        }
        let theta = degrees.to_radians() as f32;
        Bitmap::new(imageproc::geometric_transformations::rotate_about_center(
            &self.pixels,
            theta,
            imageproc::geometric_transformations::Interpolation::Nearest,
            Rgba([0, 0, 0, 0]),
        ))
    }
}

impl From<RgbaImage> for Bitmap {
    fn from(pixels: RgbaImage) -> Self {
        Self::new(pixels)
    }
}
