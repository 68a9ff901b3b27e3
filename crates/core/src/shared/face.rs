use super::geometry::{BoundingBox, Point};

/// Facial keypoint categories emitted by the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LandmarkType {
    LeftEye,
    RightEye,
    NoseBase,
    LeftMouth,
    RightMouth,
    BottomMouth,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub kind: LandmarkType,
    pub position: Point,
}

impl Landmark {
    pub const fn new(kind: LandmarkType, position: Point) -> Self {
        Self { kind, position }
    }
}

/// One tracked face as reported by a detector, in source-frame coordinates.
///
/// `position` is the top-left corner of the bounding box. Angles are in
/// degrees: `euler_y` is yaw (positive when turned toward the image's
/// right), `euler_z` is in-plane roll.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub id: u32,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub landmarks: Vec<Landmark>,
    pub euler_y: f64,
    pub euler_z: f64,
    pub confidence: f64,
}

impl Face {
    pub fn new(id: u32, position: Point, width: f64, height: f64) -> Self {
        Self {
            id,
            position,
            width,
            height,
            landmarks: Vec::new(),
            euler_y: 0.0,
            euler_z: 0.0,
            confidence: 1.0,
        }
    }

    pub fn with_landmarks(mut self, landmarks: Vec<Landmark>) -> Self {
        self.landmarks = landmarks;
        self
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_origin_size(self.position, self.width, self.height)
    }

    /// Midpoint of the bounding box.
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }

    /// Returns a copy moved by `(dx, dy)`, landmarks included.
    pub fn translated(&self, dx: f64, dy: f64) -> Face {
        let mut moved = self.clone();
        moved.position = self.position.offset(dx, dy);
        for lm in &mut moved.landmarks {
            lm.position = lm.position.offset(dx, dy);
        }
        moved
    }
}
