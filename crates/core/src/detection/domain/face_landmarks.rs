//! Raw 5-point detector keypoints and the head-pose estimates derived from them.
//!
//! Keypoint order is image-left eye, image-right eye, nose, image-left
//! mouth corner, image-right mouth corner. A point with `x <= 0` was not
//! confidently detected and is treated as invisible.

use crate::shared::face::{Landmark, LandmarkType};
use crate::shared::geometry::Point;

const LEFT_EYE: usize = 0;
const RIGHT_EYE: usize = 1;
const NOSE: usize = 2;
const LEFT_MOUTH: usize = 3;
const RIGHT_MOUTH: usize = 4;

const KINDS: [LandmarkType; 5] = [
    LandmarkType::LeftEye,
    LandmarkType::RightEye,
    LandmarkType::NoseBase,
    LandmarkType::LeftMouth,
    LandmarkType::RightMouth,
];

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    fn visible(&self, i: usize) -> Option<Point> {
        let (x, y) = self.points[i];
        (x > 0.0).then_some(Point::new(x, y))
    }

    /// Visible keypoints as typed landmarks. Adds `BottomMouth` when both
    /// mouth corners are visible.
    pub fn to_landmarks(&self) -> Vec<Landmark> {
        let mut out: Vec<Landmark> = KINDS
            .iter()
            .enumerate()
            .filter_map(|(i, kind)| self.visible(i).map(|p| Landmark::new(*kind, p)))
            .collect();
        if let (Some(l), Some(r)) = (self.visible(LEFT_MOUTH), self.visible(RIGHT_MOUTH)) {
            out.push(Landmark::new(LandmarkType::BottomMouth, l.midpoint(&r)));
        }
        out
    }

    /// In-plane head roll in degrees from the eye line; 0.0 when either eye
    /// is missing. Positive means the image-right eye sits lower.
    pub fn roll_degrees(&self) -> f64 {
        match (self.visible(LEFT_EYE), self.visible(RIGHT_EYE)) {
            (Some(l), Some(r)) if r.x != l.x || r.y != l.y => {
                (r.y - l.y).atan2(r.x - l.x).to_degrees()
            }
            _ => 0.0,
        }
    }

    /// Signed nose offset from the eye midpoint relative to eye span,
    /// clamped to [-1, 1]. 0.0 when required keypoints are missing.
    pub fn profile_ratio(&self) -> f64 {
        let (Some(nose), Some(l), Some(r)) = (
            self.visible(NOSE),
            self.visible(LEFT_EYE),
            self.visible(RIGHT_EYE),
        ) else {
            return 0.0;
        };

        let eye_span = (r.x - l.x).abs();
        if eye_span <= 0.0 {
            return 0.0;
        }
        let eye_mid_x = (l.x + r.x) / 2.0;
        ((nose.x - eye_mid_x) / eye_span).clamp(-1.0, 1.0)
    }

    /// Approximate yaw in degrees: a full profile maps to +/-90.
    pub fn yaw_degrees(&self) -> f64 {
        self.profile_ratio() * 90.0
    }
}
