/// YOLO face-pose detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, NMS, id assignment through
/// [`FaceTracker`] and head-pose estimation through [`FaceLandmarks`].
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::face::Face;
use crate::shared::frame::Frame;
use crate::shared::geometry::{BoundingBox, Point};

use super::face_tracker::{FaceTracker, TrackerInput};

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Keypoint values per detection (5 landmarks x (x, y, conf)).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    tracker: FaceTracker,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model. The input resolution is read from the model's
    /// NCHW input shape, falling back to 640 when it is dynamic.
    pub fn new(
        model_path: &Path,
        tracker: FaceTracker,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers(execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!("YOLO model input size: {input_size}");

        Ok(Self {
            session,
            tracker,
            confidence,
            input_size,
        })
    }
}

/// Hardware acceleration where the platform offers it; ort falls back to
/// CPU when a provider cannot be registered.
fn execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut raw = decode_output(data, &shape, self.confidence, &letterbox)?;
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        let inputs: Vec<TrackerInput> = kept
            .iter()
            .map(|d| TrackerInput {
                bbox: d.bbox,
                score: d.confidence,
            })
            .collect();
        let tracked = self.tracker.update(&inputs);

        Ok(tracked
            .iter()
            .map(|t| build_face(t.id, &kept[t.det_index]))
            .collect())
    }
}

fn build_face(id: u32, det: &RawDetection) -> Face {
    let mut face = Face::new(
        id,
        Point::new(det.bbox.x1, det.bbox.y1),
        det.bbox.width(),
        det.bbox.height(),
    );
    face.confidence = det.confidence;
    if let Some(points) = det.keypoints {
        let lm = FaceLandmarks::new(points);
        face.landmarks = lm.to_landmarks();
        face.euler_y = lm.yaw_degrees();
        face.euler_z = lm.roll_degrees();
    }
    face
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Mapping between letterboxed model space and source-frame space.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` x `target_size`, normalised
/// NCHW float32 with 114/255 gray padding.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let size = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, size, size), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    bbox: BoundingBox,
    confidence: f64,
    keypoints: Option<[(f64, f64); 5]>,
}

/// Parses `[1, features, detections]` (or the transposed layout) rows of
/// `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]` in letterbox space.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    min_confidence: f64,
    letterbox: &Letterbox,
) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err("YOLO output shorter than its shape".into());
    }
    if num_feats < 5 {
        return Ok(Vec::new());
    }

    let value = |det: usize, feat: usize| -> f64 {
        if transposed {
            data[feat * num_dets + det] as f64
        } else {
            data[det * num_feats + feat] as f64
        }
    };

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let conf = value(i, 4);
        if conf < min_confidence {
            continue;
        }

        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        let (x1, y1) = letterbox.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_frame(cx + w / 2.0, cy + h / 2.0);

        // Unconfident keypoints stay at (0, 0), which FaceLandmarks treats as invisible.
        let keypoints = (num_feats >= 5 + NUM_KEYPOINT_VALUES).then(|| {
            let mut pts = [(0.0f64, 0.0f64); 5];
            for (k, pt) in pts.iter_mut().enumerate() {
                let base = 5 + k * 3;
                if value(i, base + 2) >= KEYPOINT_CONF_THRESH {
                    *pt = letterbox.to_frame(value(i, base), value(i, base + 1));
                }
            }
            pts
        });

        dets.push(RawDetection {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            confidence: conf,
            keypoints,
        });
    }
    Ok(dets)
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets.iter() {
        if keep.iter().all(|k| k.bbox.iou(&det.bbox) <= iou_thresh) {
            keep.push(det.clone());
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
