use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::overlay::domain::canvas::{BlendMode, Canvas, Color, Paint};
use crate::overlay::domain::graphic::Graphic;
use crate::overlay::domain::graphic_overlay::{GraphicOverlay, Invalidator};
use crate::overlay::domain::overlay_transform::{Facing, OverlayTransform};
use crate::shared::constants::{BOX_STROKE_WIDTH, FACE_POSITION_RADIUS};
use crate::shared::face::{Face, LandmarkType};
use crate::shared::geometry::{BoundingBox, Point};

use super::decoration::Decoration;

const COLOR_CHOICES: [Color; 7] = [
    Color::BLUE,
    Color::CYAN,
    Color::GREEN,
    Color::MAGENTA,
    Color::RED,
    Color::WHITE,
    Color::YELLOW,
];

/// Shared across all graphics so neighbouring faces get distinct colours.
static CURRENT_COLOR_INDEX: AtomicUsize = AtomicUsize::new(0);

fn next_color() -> Color {
    let index = CURRENT_COLOR_INDEX.fetch_add(1, Ordering::Relaxed) + 1;
    COLOR_CHOICES[index % COLOR_CHOICES.len()]
}

const LANDMARK_MARKERS: [LandmarkType; 6] = [
    LandmarkType::LeftEye,
    LandmarkType::RightEye,
    LandmarkType::NoseBase,
    LandmarkType::LeftMouth,
    LandmarkType::RightMouth,
    LandmarkType::BottomMouth,
];

/// How a [`FaceGraphic`] renders its decoration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecorationStyle {
    pub blend: BlendMode,
    /// Keep the decoration's aspect ratio instead of drawing it square.
    pub preserve_aspect: bool,
    /// Rotate the decoration with the head's roll.
    pub rotate_with_face: bool,
    pub show_bounding_box: bool,
    pub show_landmarks: bool,
}

/// Draws the decoration over the most recent detection of one face.
///
/// The detection thread replaces the face through [`FaceGraphic::update_face`]
/// while the render thread reads a snapshot in [`Graphic::draw`].
pub struct FaceGraphic {
    invalidator: Invalidator,
    decoration: Decoration,
    style: DecorationStyle,
    color: Color,
    id: AtomicU32,
    face: RwLock<Option<Arc<Face>>>,
}

impl FaceGraphic {
    pub fn new(overlay: &GraphicOverlay, decoration: Decoration, style: DecorationStyle) -> Self {
        Self {
            invalidator: overlay.invalidator(),
            decoration,
            style,
            color: next_color(),
            id: AtomicU32::new(0),
            face: RwLock::new(None),
        }
    }

    pub fn set_id(&self, id: u32) {
        self.id.store(id, Ordering::Relaxed);
    }

    pub fn id(&self) -> u32 {
        self.id.load(Ordering::Relaxed)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Replaces the held face with the latest detection and requests a
    /// redraw of the overlay.
    pub fn update_face(&self, face: Face) {
        *self.face.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(face));
        self.invalidator.post_invalidate();
    }

    pub fn clear_face(&self) {
        *self.face.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.invalidator.post_invalidate();
    }

    /// Snapshot of the held face.
    pub fn face(&self) -> Option<Arc<Face>> {
        self.face
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn draw_annotations(
        &self,
        canvas: &mut dyn Canvas,
        transform: &OverlayTransform,
        face: &Face,
        center: Point,
    ) {
        if self.style.show_bounding_box {
            let x_offset = transform.scale_x(face.width / 2.0);
            let y_offset = transform.scale_y(face.height / 2.0);
            let rect = BoundingBox::new(
                center.x - x_offset,
                center.y - y_offset,
                center.x + x_offset,
                center.y + y_offset,
            );
            canvas.draw_rect(rect, &Paint::stroke(self.color, BOX_STROKE_WIDTH));
        }
        if self.style.show_landmarks {
            let paint = Paint::fill(self.color);
            for kind in LANDMARK_MARKERS {
                if let Some(p) = landmark_position(face, kind) {
                    let at = Point::new(transform.translate_x(p.x), transform.translate_y(p.y));
                    canvas.draw_circle(at, FACE_POSITION_RADIUS, &paint);
                }
            }
        }
    }
}

impl Graphic for FaceGraphic {
    fn draw(&self, canvas: &mut dyn Canvas, transform: &OverlayTransform) {
        let Some(face) = self.face() else {
            return;
        };

        let center = face.center();
        let x = transform.translate_x(center.x);
        let y = transform.translate_y(center.y);

        let source = self.decoration.bitmap();
        let width = face.width.max(0.0) as u32;
        let height = if self.style.preserve_aspect {
            (width as u64 * source.height() as u64 / source.width() as u64) as u32
        } else {
            width
        };
        if width > 0 && height > 0 {
            let mut bitmap = source.scaled(width, height);
            if self.style.rotate_with_face && face.euler_z != 0.0 {
                // Mirrored previews flip the apparent direction of roll.
                let roll = match transform.facing() {
                    Facing::Front => -face.euler_z,
                    Facing::Back => face.euler_z,
                };
                bitmap = bitmap.rotated(roll);
            }
            let left = x - (bitmap.width() / 2) as f64;
            let top = y - (bitmap.height() / 2) as f64;
            canvas.draw_bitmap(&bitmap, left, top, self.style.blend);
        }

        self.draw_annotations(canvas, transform, &face, Point::new(x, y));
    }
}

/// Position of the first landmark of `kind`, if the detector reported one.
pub fn landmark_position(face: &Face, kind: LandmarkType) -> Option<Point> {
    face.landmarks
        .iter()
        .find(|l| l.kind == kind)
        .map(|l| l.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bitmap::Bitmap;
    use crate::shared::face::Landmark;
    use approx::assert_relative_eq;
    use image::{Rgba, RgbaImage};
    use rstest::rstest;

    #[derive(Debug, PartialEq)]
    enum Op {
        Bitmap {
            width: u32,
            height: u32,
            left: f64,
            top: f64,
            mode: BlendMode,
        },
        Rect(BoundingBox),
        Circle(Point),
    }

    #[derive(Default)]
    struct RecordingCanvas {
        ops: Vec<Op>,
        bitmaps: Vec<Bitmap>,
        paints: Vec<Paint>,
    }

    impl Canvas for RecordingCanvas {
        fn width(&self) -> u32 {
            640
        }
        fn height(&self) -> u32 {
            480
        }
        fn draw_bitmap(&mut self, bitmap: &Bitmap, left: f64, top: f64, mode: BlendMode) {
            self.bitmaps.push(bitmap.clone());
            self.ops.push(Op::Bitmap {
                width: bitmap.width(),
                height: bitmap.height(),
                left,
                top,
                mode,
            });
        }
        fn draw_rect(&mut self, rect: BoundingBox, paint: &Paint) {
            self.paints.push(*paint);
            self.ops.push(Op::Rect(rect));
        }
        fn draw_circle(&mut self, center: Point, _radius: f64, paint: &Paint) {
            self.paints.push(*paint);
            self.ops.push(Op::Circle(center));
        }
    }

    fn decoration(width: u32, height: u32) -> Decoration {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        Decoration::new("test", Bitmap::new(img)).unwrap()
    }

    fn graphic(style: DecorationStyle) -> (GraphicOverlay, FaceGraphic) {
        let overlay = GraphicOverlay::new();
        let g = FaceGraphic::new(&overlay, decoration(200, 100), style);
        (overlay, g)
    }

    fn face(x: f64, y: f64, w: f64, h: f64) -> Face {
        Face::new(1, Point::new(x, y), w, h)
    }

    fn draw(g: &FaceGraphic, transform: &OverlayTransform) -> Vec<Op> {
        let mut canvas = RecordingCanvas::default();
        g.draw(&mut canvas, transform);
        canvas.ops
    }

    /// 40x40 decoration: opaque red top half, transparent bottom half.
    fn half_red_graphic(style: DecorationStyle) -> (GraphicOverlay, FaceGraphic) {
        let img = RgbaImage::from_fn(40, 40, |_, y| {
            if y < 20 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let overlay = GraphicOverlay::new();
        let deco = Decoration::new("half", Bitmap::new(img)).unwrap();
        let g = FaceGraphic::new(&overlay, deco, style);
        (overlay, g)
    }

    fn rolled_blit(facing: Facing, euler_z: f64) -> (Op, Bitmap) {
        let (_overlay, g) = half_red_graphic(DecorationStyle {
            rotate_with_face: true,
            ..Default::default()
        });
        let mut f = face(100.0, 100.0, 40.0, 40.0);
        f.euler_z = euler_z;
        g.update_face(f);
        let mut canvas = RecordingCanvas::default();
        g.draw(&mut canvas, &OverlayTransform::new(640, 480, 640, 480, facing));
        let op = canvas.ops.remove(0);
        (op, canvas.bitmaps.remove(0))
    }

    #[test]
    fn test_no_face_draws_nothing() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        assert!(draw(&g, &OverlayTransform::identity(640, 480)).is_empty());
    }

    #[test]
    fn test_decoration_width_matches_face_width() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        g.update_face(face(100.0, 50.0, 120.0, 160.0));
        let ops = draw(&g, &OverlayTransform::identity(640, 480));
        match &ops[0] {
            Op::Bitmap { width, height, .. } => {
                assert_eq!(*width, 120);
                // Square by default, like the face width on both axes.
                assert_eq!(*height, 120);
            }
            other => panic!("expected bitmap, got {other:?}"),
        }
    }

    #[test]
    fn test_decoration_centred_on_face_box() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        g.update_face(face(100.0, 50.0, 120.0, 160.0));
        let ops = draw(&g, &OverlayTransform::identity(640, 480));
        let Op::Bitmap { width, height, left, top, mode } = &ops[0] else {
            panic!("expected bitmap");
        };
        // Box midpoint is (160, 130).
        assert_relative_eq!(left + *width as f64 / 2.0, 160.0);
        assert_relative_eq!(top + *height as f64 / 2.0, 130.0);
        assert_eq!(*mode, BlendMode::Src);
    }

    #[test]
    fn test_fractional_width_truncates() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        g.update_face(face(0.0, 0.0, 99.9, 80.0));
        let ops = draw(&g, &OverlayTransform::identity(640, 480));
        assert!(matches!(ops[0], Op::Bitmap { width: 99, height: 99, .. }));
    }

    #[test]
    fn test_centre_goes_through_transform() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        g.update_face(face(10.0, 20.0, 40.0, 40.0));
        // 320x240 preview in a 640x480 view, front camera.
        let t = OverlayTransform::new(320, 240, 640, 480, Facing::Front);
        let ops = draw(&g, &t);
        let Op::Bitmap { width, left, top, .. } = &ops[0] else {
            panic!("expected bitmap");
        };
        // Face width is not scaled; only the centre is transformed.
        assert_eq!(*width, 40);
        assert_relative_eq!(*left, 640.0 - 60.0 - 20.0);
        assert_relative_eq!(*top, 80.0 - 20.0);
    }

    #[test]
    fn test_zero_width_face_draws_no_bitmap() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        g.update_face(face(10.0, 10.0, 0.0, 10.0));
        assert!(draw(&g, &OverlayTransform::identity(640, 480)).is_empty());
    }

    #[test]
    fn test_preserve_aspect_uses_bitmap_ratio() {
        let (_overlay, g) = graphic(DecorationStyle {
            preserve_aspect: true,
            ..Default::default()
        });
        g.update_face(face(0.0, 0.0, 100.0, 100.0));
        let ops = draw(&g, &OverlayTransform::identity(640, 480));
        assert!(matches!(ops[0], Op::Bitmap { width: 100, height: 50, .. }));
    }

    #[test]
    fn test_blend_mode_is_forwarded() {
        let (_overlay, g) = graphic(DecorationStyle {
            blend: BlendMode::SrcOver,
            ..Default::default()
        });
        g.update_face(face(0.0, 0.0, 10.0, 10.0));
        let ops = draw(&g, &OverlayTransform::identity(640, 480));
        assert!(matches!(ops[0], Op::Bitmap { mode: BlendMode::SrcOver, .. }));
    }

    #[test]
    fn test_update_replaces_previous_face() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        g.update_face(face(0.0, 0.0, 10.0, 10.0));
        g.update_face(face(100.0, 100.0, 20.0, 20.0));
        let ops = draw(&g, &OverlayTransform::identity(640, 480));
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], Op::Bitmap { width: 20, left, .. } if left == 100.0));
    }

    #[test]
    fn test_update_and_clear_invalidate_overlay() {
        let (overlay, g) = graphic(DecorationStyle::default());
        g.update_face(face(0.0, 0.0, 10.0, 10.0));
        assert!(overlay.take_invalidated());
        g.clear_face();
        assert!(overlay.take_invalidated());
        assert!(g.face().is_none());
        assert!(draw(&g, &OverlayTransform::identity(640, 480)).is_empty());
    }

    #[test]
    fn test_bounding_box_annotation() {
        let (_overlay, g) = graphic(DecorationStyle {
            show_bounding_box: true,
            ..Default::default()
        });
        g.update_face(face(100.0, 50.0, 120.0, 160.0));
        let ops = draw(&g, &OverlayTransform::identity(640, 480));
        assert_eq!(ops[1], Op::Rect(BoundingBox::new(100.0, 50.0, 220.0, 210.0)));
    }

    #[test]
    fn test_landmark_annotations_follow_transform() {
        let (_overlay, g) = graphic(DecorationStyle {
            show_landmarks: true,
            ..Default::default()
        });
        g.update_face(face(0.0, 0.0, 10.0, 10.0).with_landmarks(vec![
            Landmark::new(LandmarkType::NoseBase, Point::new(5.0, 6.0)),
        ]));
        let t = OverlayTransform::new(100, 100, 200, 200, Facing::Back);
        let ops = draw(&g, &t);
        assert_eq!(ops[1], Op::Circle(Point::new(10.0, 12.0)));
    }

    #[rstest]
    #[case::back(Facing::Back, 120.0, 30.0)]
    #[case::front(Facing::Front, 520.0, -30.0)]
    fn test_rotation_keeps_size_and_centre(
        #[case] facing: Facing,
        #[case] center_x: f64,
        #[case] applied_degrees: f64,
    ) {
        let (op, bitmap) = rolled_blit(facing, 30.0);
        let Op::Bitmap { width, height, left, top, .. } = op else {
            panic!("expected bitmap");
        };
        assert_eq!((width, height), (40, 40));
        assert_relative_eq!(left + 20.0, center_x);
        assert_relative_eq!(top + 20.0, 120.0);

        let (_overlay, g) = half_red_graphic(DecorationStyle::default());
        assert_eq!(bitmap, g.decoration.bitmap().scaled(40, 40).rotated(applied_degrees));
    }

    #[test]
    fn test_front_and_back_roll_in_opposite_directions() {
        let (_, back) = rolled_blit(Facing::Back, 30.0);
        let (_, front) = rolled_blit(Facing::Front, 30.0);
        // Points either side of the centre line: the tilted edge separates
        // them, and mirroring the roll swaps which side is covered.
        assert_ne!(back.pixel(8, 17), back.pixel(31, 17));
        assert_eq!(back.pixel(8, 17), front.pixel(31, 17));
        assert_eq!(back.pixel(31, 17), front.pixel(8, 17));
    }

    #[test]
    fn test_roll_ignored_unless_enabled() {
        let (_overlay, g) = half_red_graphic(DecorationStyle::default());
        let mut f = face(0.0, 0.0, 40.0, 40.0);
        f.euler_z = 30.0;
        g.update_face(f);
        let mut canvas = RecordingCanvas::default();
        g.draw(&mut canvas, &OverlayTransform::identity(640, 480));
        assert_eq!(&canvas.bitmaps[0], g.decoration.bitmap());
    }

    #[test]
    fn test_annotations_use_graphic_colour() {
        let (_overlay, g) = graphic(DecorationStyle {
            show_bounding_box: true,
            show_landmarks: true,
            ..Default::default()
        });
        g.update_face(face(0.0, 0.0, 10.0, 10.0).with_landmarks(vec![
            Landmark::new(LandmarkType::LeftEye, Point::new(2.0, 3.0)),
        ]));
        let mut canvas = RecordingCanvas::default();
        g.draw(&mut canvas, &OverlayTransform::identity(640, 480));
        assert_eq!(
            canvas.paints,
            vec![
                Paint::stroke(g.color(), BOX_STROKE_WIDTH),
                Paint::fill(g.color()),
            ]
        );
    }

    #[test]
    fn test_set_id_round_trips() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        g.set_id(42);
        assert_eq!(g.id(), 42);
    }

    #[test]
    fn test_colors_come_from_palette() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        assert!(COLOR_CHOICES.contains(&g.color()));
    }

    #[rstest]
    #[case::present(LandmarkType::LeftEye, Some(Point::new(1.0, 2.0)))]
    #[case::first_match_wins(LandmarkType::NoseBase, Some(Point::new(3.0, 4.0)))]
    #[case::absent(LandmarkType::RightMouth, None)]
    fn test_landmark_position(#[case] kind: LandmarkType, #[case] expected: Option<Point>) {
        let f = face(0.0, 0.0, 10.0, 10.0).with_landmarks(vec![
            Landmark::new(LandmarkType::LeftEye, Point::new(1.0, 2.0)),
            Landmark::new(LandmarkType::NoseBase, Point::new(3.0, 4.0)),
            Landmark::new(LandmarkType::NoseBase, Point::new(9.0, 9.0)),
        ]);
        assert_eq!(landmark_position(&f, kind), expected);
    }

    #[test]
    fn test_concurrent_updates_and_draws() {
        let (_overlay, g) = graphic(DecorationStyle::default());
        let g = Arc::new(g);
        let writer = {
            let g = g.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    g.update_face(face(i as f64, 0.0, 10.0 + (i % 5) as f64, 10.0));
                }
            })
        };
        for _ in 0..200 {
            let ops = draw(&g, &OverlayTransform::identity(640, 480));
            // Each draw sees either nothing yet or one complete face.
            assert!(ops.len() <= 1);
        }
        writer.join().unwrap();
        assert!(g.face().is_some());
    }
}
