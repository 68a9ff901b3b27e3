use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::shared::bitmap::Bitmap;

#[derive(Error, Debug)]
pub enum DecorationError {
    #[error("failed to decode decoration {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("decoration {0} has no pixels")]
    EmptyImage(String),
}

/// The sprite drawn on every tracked face.
///
/// Cloning shares the underlying bitmap, so one decoded image serves all
/// graphics for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct Decoration {
    name: String,
    bitmap: Arc<Bitmap>,
}

impl Decoration {
    pub fn new(name: impl Into<String>, bitmap: Bitmap) -> Result<Self, DecorationError> {
        let name = name.into();
        if bitmap.is_empty() {
            return Err(DecorationError::EmptyImage(name));
        }
        Ok(Self {
            name,
            bitmap: Arc::new(bitmap),
        })
    }

    /// For artwork generated in-process with constant, non-zero size.
    pub(crate) fn builtin(name: &str, bitmap: Bitmap) -> Self {
        debug_assert!(!bitmap.is_empty());
        Self {
            name: name.to_string(),
            bitmap: Arc::new(bitmap),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// True when both handles point at the same decoded bitmap.
    pub fn shares_bitmap_with(&self, other: &Decoration) -> bool {
        Arc::ptr_eq(&self.bitmap, &other.bitmap)
    }
}
