use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
};
use imageproc::rect::Rect;

use crate::overlay::domain::canvas::{BlendMode, Canvas, Paint, PaintStyle};
use crate::shared::bitmap::Bitmap;
use crate::shared::frame::Frame;
use crate::shared::geometry::{BoundingBox, Point};

/// Transparent RGBA layer that graphics draw onto; composited over a frame
/// once all graphics have drawn.
pub struct RasterCanvas {
    layer: RgbaImage,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layer: RgbaImage::new(width, height),
        }
    }

    pub fn layer(&self) -> &RgbaImage {
        &self.layer
    }

    /// Resets every pixel to transparent.
    pub fn clear(&mut self) {
        self.layer.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
    }

    pub fn is_blank(&self) -> bool {
        self.layer.pixels().all(|p| p.0[3] == 0)
    }

    /// Alpha-blends the layer over `frame`. Only the region both cover is
    /// touched.
    pub fn composite_onto(&self, frame: &mut Frame) {
        let w = self.layer.width().min(frame.width());
        let h = self.layer.height().min(frame.height());
        for y in 0..h {
            for x in 0..w {
                let src = self.layer.get_pixel(x, y).0;
                match src[3] {
                    0 => {}
                    255 => frame.set_pixel(x, y, [src[0], src[1], src[2]]),
                    a => {
                        let dst = frame.pixel(x, y);
                        let alpha = a as f32 / 255.0;
                        let mix = |s: u8, d: u8| {
                            (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8
                        };
                        frame.set_pixel(
                            x,
                            y,
                            [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2])],
                        );
                    }
                }
            }
        }
    }

    fn stroke_offsets(stroke_width: f64) -> std::ops::Range<i32> {
        let w = stroke_width.round().max(1.0) as i32;
        let start = -(w / 2);
        start..start + w
    }
}

/// Straight-alpha source-over.
fn src_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let channel = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round() as u8
    };
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ]
}

impl Canvas for RasterCanvas {
    fn width(&self) -> u32 {
        self.layer.width()
    }

    fn height(&self) -> u32 {
        self.layer.height()
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, left: f64, top: f64, mode: BlendMode) {
        let left = left.round() as i64;
        let top = top.round() as i64;
        let (lw, lh) = (self.layer.width() as i64, self.layer.height() as i64);

        // Clip the source rectangle to the layer.
        let sx0 = (-left).max(0);
        let sy0 = (-top).max(0);
        let sx1 = (bitmap.width() as i64).min(lw - left);
        let sy1 = (bitmap.height() as i64).min(lh - top);

        for sy in sy0..sy1 {
            for sx in sx0..sx1 {
                let src = bitmap.pixel(sx as u32, sy as u32);
                let (dx, dy) = ((left + sx) as u32, (top + sy) as u32);
                let out = match mode {
                    BlendMode::Src => src,
                    BlendMode::SrcOver => src_over(src, self.layer.get_pixel(dx, dy).0),
                };
                self.layer.put_pixel(dx, dy, Rgba(out));
            }
        }
    }

    fn draw_rect(&mut self, rect: BoundingBox, paint: &Paint) {
        let color = Rgba(paint.color.0);
        let x = rect.x1.round() as i32;
        let y = rect.y1.round() as i32;
        let w = rect.width().round() as i32;
        let h = rect.height().round() as i32;
        match paint.style {
            PaintStyle::Fill => {
                if w > 0 && h > 0 {
                    draw_filled_rect_mut(&mut self.layer, Rect::at(x, y).of_size(w as u32, h as u32), color);
                }
            }
            PaintStyle::Stroke => {
                // Strokes are centred on the rectangle edge.
                for d in Self::stroke_offsets(paint.stroke_width) {
                    let (sw, sh) = (w + 2 * d, h + 2 * d);
                    if sw > 0 && sh > 0 {
                        draw_hollow_rect_mut(
                            &mut self.layer,
                            Rect::at(x - d, y - d).of_size(sw as u32, sh as u32),
                            color,
                        );
                    }
                }
            }
        }
    }

    fn draw_circle(&mut self, center: Point, radius: f64, paint: &Paint) {
        let color = Rgba(paint.color.0);
        let c = (center.x.round() as i32, center.y.round() as i32);
        let r = radius.round() as i32;
        match paint.style {
            PaintStyle::Fill => draw_filled_circle_mut(&mut self.layer, c, r, color),
            PaintStyle::Stroke => {
                for d in Self::stroke_offsets(paint.stroke_width) {
                    if r + d > 0 {
                        draw_hollow_circle_mut(&mut self.layer, c, r + d, color);
                    }
                }
            }
        }
    }
}
