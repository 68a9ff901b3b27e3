pub mod decoration;
pub mod face_graphic;
pub mod face_graphic_tracker;
