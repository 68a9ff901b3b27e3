pub mod canvas;
pub mod graphic;
pub mod graphic_overlay;
pub mod overlay_transform;
