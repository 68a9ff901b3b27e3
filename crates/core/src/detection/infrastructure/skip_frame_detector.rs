use std::collections::HashMap;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::face::Face;
use crate::shared::frame::Frame;
use crate::shared::geometry::Point;

/// Decorator that runs detection every N frames, reusing results in between.
///
/// On skipped frames each face is moved along the per-frame velocity seen
/// between its last two real detections, so decorations glide instead of
/// jumping every N frames.
pub struct SkipFrameDetector {
    inner: Box<dyn FaceDetector>,
    interval: usize,
    frame_count: usize,
    last_faces: Vec<Face>,
    velocity: HashMap<u32, (f64, f64)>,
    frames_since_detect: usize,
}

impl SkipFrameDetector {
    pub fn new(inner: Box<dyn FaceDetector>, interval: usize) -> Result<Self, &'static str> {
        if interval < 1 {
            return Err("skip interval must be >= 1");
        }
        Ok(Self {
            inner,
            interval,
            frame_count: 0,
            last_faces: Vec::new(),
            velocity: HashMap::new(),
            frames_since_detect: 0,
        })
    }

    fn record(&mut self, faces: Vec<Face>) {
        let previous: HashMap<u32, Point> =
            self.last_faces.iter().map(|f| (f.id, f.position)).collect();
        self.velocity = faces
            .iter()
            .filter_map(|f| {
                previous.get(&f.id).map(|old| {
                    let dx = (f.position.x - old.x) / self.interval as f64;
                    let dy = (f.position.y - old.y) / self.interval as f64;
                    (f.id, (dx, dy))
                })
            })
            .collect();
        self.last_faces = faces;
    }

    fn extrapolated(&self, steps: usize) -> Vec<Face> {
        self.last_faces
            .iter()
            .map(|f| match self.velocity.get(&f.id) {
                Some(&(dx, dy)) => f.translated(dx * steps as f64, dy * steps as f64),
                None => f.clone(),
            })
            .collect()
    }
}

impl FaceDetector for SkipFrameDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
        let run_inner = self.frame_count % self.interval == 0;
        self.frame_count += 1;

        if run_inner {
            let faces = self.inner.detect(frame)?;
            self.record(faces);
            self.frames_since_detect = 0;
            Ok(self.last_faces.clone())
        } else {
            self.frames_since_detect += 1;
            Ok(self.extrapolated(self.frames_since_detect))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ScriptedDetector {
        results: Vec<Vec<Face>>,
        calls: Arc<AtomicUsize>,
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.results[n.min(self.results.len() - 1)].clone())
        }
    }

    fn face(id: u32, x: f64, y: f64) -> Face {
        Face::new(id, Point::new(x, y), 50.0, 50.0)
    }

    fn frame() -> Frame {
        Frame::filled(10, 10, [0, 0, 0], 0)
    }

    fn detector(results: Vec<Vec<Face>>, interval: usize) -> (SkipFrameDetector, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = ScriptedDetector {
            results,
            calls: calls.clone(),
        };
        (SkipFrameDetector::new(Box::new(inner), interval).unwrap(), calls)
    }

    #[test]
    fn test_zero_interval_rejected() {
        let (inner, _) = detector(vec![vec![]], 1);
        assert!(SkipFrameDetector::new(Box::new(inner), 0).is_err());
    }

    #[test]
    fn test_interval_one_runs_every_frame() {
        let (mut d, calls) = detector(vec![vec![face(1, 0.0, 0.0)]], 1);
        for _ in 0..4 {
            d.detect(&frame()).unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_skipped_frames_reuse_without_velocity() {
        let (mut d, calls) = detector(vec![vec![face(1, 10.0, 20.0)]], 3);
        let first = d.detect(&frame()).unwrap();
        let second = d.detect(&frame()).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_skipped_frames_extrapolate_velocity() {
        // Moves 30px between real detections two frames apart → 15px/frame.
        let (mut d, _) = detector(
            vec![vec![face(1, 0.0, 0.0)], vec![face(1, 30.0, 0.0)]],
            2,
        );
        d.detect(&frame()).unwrap(); // real
        d.detect(&frame()).unwrap(); // skipped
        d.detect(&frame()).unwrap(); // real, x = 30
        let faces = d.detect(&frame()).unwrap(); // skipped
        assert_relative_eq!(faces[0].position.x, 45.0);
        assert_relative_eq!(faces[0].position.y, 0.0);
    }

    #[test]
    fn test_new_face_has_no_velocity() {
        let (mut d, _) = detector(
            vec![vec![face(1, 0.0, 0.0)], vec![face(2, 30.0, 0.0)]],
            2,
        );
        d.detect(&frame()).unwrap();
        d.detect(&frame()).unwrap();
        d.detect(&frame()).unwrap();
        let faces = d.detect(&frame()).unwrap();
        assert_eq!(faces[0].id, 2);
        assert_relative_eq!(faces[0].position.x, 30.0);
    }
}
