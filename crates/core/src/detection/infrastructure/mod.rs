pub mod face_tracker;
pub mod model_resolver;
pub mod onnx_yolo_detector;
pub mod skip_frame_detector;
