use super::canvas::Canvas;
use super::overlay_transform::OverlayTransform;

/// Something drawn on the overlay, e.g. a decoration on one face.
///
/// Graphics are updated from detection threads and drawn from the render
/// thread, hence `Send + Sync` with interior mutability.
pub trait Graphic: Send + Sync {
    fn draw(&self, canvas: &mut dyn Canvas, transform: &OverlayTransform);
}
