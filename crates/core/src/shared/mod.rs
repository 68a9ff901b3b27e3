pub mod bitmap;
pub mod constants;
pub mod face;
pub mod frame;
pub mod geometry;
pub mod source_metadata;
