use crate::overlay::domain::graphic_overlay::GraphicOverlay;
use crate::overlay::domain::overlay_transform::Facing;
use crate::overlay::infrastructure::raster_canvas::RasterCanvas;
use crate::shared::frame::Frame;

/// Presents frames the way a preview view would: mirrored for a front
/// camera, with the overlay layer drawn on top.
///
/// The overlay is only redrawn when it was invalidated or the frame size
/// changed; otherwise the cached layer is reused.
pub struct FrameCompositor {
    facing: Facing,
    canvas: Option<RasterCanvas>,
    redraws: usize,
}

impl FrameCompositor {
    pub fn new(facing: Facing) -> Self {
        Self {
            facing,
            canvas: None,
            redraws: 0,
        }
    }

    /// Number of times the overlay layer was redrawn.
    pub fn redraws(&self) -> usize {
        self.redraws
    }

    pub fn present(&mut self, overlay: &GraphicOverlay, frame: &mut Frame) {
        if self.facing == Facing::Front {
            frame.flip_horizontal();
        }

        let resized = self
            .canvas
            .as_ref()
            .map_or(true, |c| c.layer().dimensions() != (frame.width(), frame.height()));
        if resized {
            self.canvas = Some(RasterCanvas::new(frame.width(), frame.height()));
        }
        // Consumed on every frame, redrawn or not.
        let invalidated = overlay.take_invalidated();

        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        if resized || invalidated {
            canvas.clear();
            overlay.draw(&mut *canvas);
            self.redraws += 1;
        }
        canvas.composite_onto(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::domain::canvas::{Canvas, Color, Paint};
    use crate::overlay::domain::graphic::Graphic;
    use crate::overlay::domain::overlay_transform::OverlayTransform;
    use crate::shared::geometry::Point;
    use std::sync::Arc;

    /// Filled dot at a fixed preview position.
    struct Dot(f64, f64);

    impl Graphic for Dot {
        fn draw(&self, canvas: &mut dyn Canvas, transform: &OverlayTransform) {
            let p = Point::new(transform.translate_x(self.0), transform.translate_y(self.1));
            canvas.draw_circle(p, 1.0, &Paint::fill(Color::RED));
        }
    }

    fn overlay_with_dot(facing: Facing) -> GraphicOverlay {
        let overlay = GraphicOverlay::new();
        overlay.set_camera_info(20, 10, facing);
        overlay.add(Arc::new(Dot(3.0, 5.0)));
        overlay
    }

    #[test]
    fn test_overlay_drawn_onto_frame() {
        let overlay = overlay_with_dot(Facing::Back);
        let mut compositor = FrameCompositor::new(Facing::Back);
        let mut frame = Frame::filled(20, 10, [0, 0, 0], 0);
        compositor.present(&overlay, &mut frame);
        assert_eq!(frame.pixel(3, 5), [255, 0, 0]);
        assert_eq!(frame.pixel(15, 5), [0, 0, 0]);
    }

    #[test]
    fn test_front_facing_mirrors_frame_and_overlay_together() {
        let overlay = overlay_with_dot(Facing::Front);
        let mut compositor = FrameCompositor::new(Facing::Front);
        let mut frame = Frame::filled(20, 10, [0, 0, 0], 0);
        frame.set_pixel(3, 0, [0, 0, 255]);
        compositor.present(&overlay, &mut frame);
        // Both the marker pixel and the dot land on the mirrored side.
        assert_eq!(frame.pixel(16, 0), [0, 0, 255]);
        assert_eq!(frame.pixel(17, 5), [255, 0, 0]);
    }

    #[test]
    fn test_layer_cached_until_invalidated() {
        let overlay = overlay_with_dot(Facing::Back);
        let mut compositor = FrameCompositor::new(Facing::Back);
        for i in 0..3 {
            let mut frame = Frame::filled(20, 10, [0, 0, 0], i);
            compositor.present(&overlay, &mut frame);
            assert_eq!(frame.pixel(3, 5), [255, 0, 0]);
        }
        assert_eq!(compositor.redraws(), 1);

        overlay.post_invalidate();
        compositor.present(&overlay, &mut Frame::filled(20, 10, [0, 0, 0], 3));
        assert_eq!(compositor.redraws(), 2);
    }

    #[test]
    fn test_size_change_forces_redraw() {
        let overlay = overlay_with_dot(Facing::Back);
        let mut compositor = FrameCompositor::new(Facing::Back);
        compositor.present(&overlay, &mut Frame::filled(20, 10, [0, 0, 0], 0));
        compositor.present(&overlay, &mut Frame::filled(40, 20, [0, 0, 0], 1));
        assert_eq!(compositor.redraws(), 2);
    }
}
