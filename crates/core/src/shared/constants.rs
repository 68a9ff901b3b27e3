pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Max frames a track can go unmatched before removal (~1 second at 30 fps).
pub const TRACKER_MAX_LOST: usize = 30;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Frame rate assumed for image sequences when none is given.
pub const DEFAULT_SEQUENCE_FPS: f64 = 30.0;

/// Radius of the landmark markers drawn in debug mode.
pub const FACE_POSITION_RADIUS: f64 = 10.0;

/// Stroke width of the bounding box drawn in debug mode.
pub const BOX_STROKE_WIDTH: f64 = 5.0;

/// Application directory name used for caches and settings.
pub const APP_DIR_NAME: &str = "FaceDeco";
