pub mod decorate_image_use_case;
pub mod frame_compositor;
pub mod live_preview_use_case;
pub mod pipeline_logger;
