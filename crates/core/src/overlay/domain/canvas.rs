use crate::shared::bitmap::Bitmap;
use crate::shared::geometry::{BoundingBox, Point};

/// Straight (non-premultiplied) RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLUE: Color = Color([0, 0, 255, 255]);
    pub const CYAN: Color = Color([0, 255, 255, 255]);
    pub const GREEN: Color = Color([0, 255, 0, 255]);
    pub const MAGENTA: Color = Color([255, 0, 255, 255]);
    pub const RED: Color = Color([255, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const YELLOW: Color = Color([255, 255, 0, 255]);
    pub const TRANSPARENT: Color = Color([0, 0, 0, 0]);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaintStyle {
    Fill,
    Stroke,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub style: PaintStyle,
    pub stroke_width: f64,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            style: PaintStyle::Fill,
            stroke_width: 0.0,
        }
    }

    pub fn stroke(color: Color, stroke_width: f64) -> Self {
        Self {
            color,
            style: PaintStyle::Stroke,
            stroke_width,
        }
    }
}

/// How source pixels combine with what is already on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Replace destination pixels, alpha included.
    #[default]
    Src,
    /// Porter-Duff source-over alpha blending.
    SrcOver,
}

/// Drawing surface that graphics render onto, in view coordinates.
///
/// Implementations clip everything to their bounds.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn draw_bitmap(&mut self, bitmap: &Bitmap, left: f64, top: f64, mode: BlendMode);
    fn draw_rect(&mut self, rect: BoundingBox, paint: &Paint);
    fn draw_circle(&mut self, center: Point, radius: f64, paint: &Paint);
}
