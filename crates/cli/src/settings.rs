use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use facedeco_core::decoration::domain::face_graphic::DecorationStyle;
use facedeco_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use facedeco_core::overlay::domain::canvas::BlendMode;
use facedeco_core::overlay::domain::overlay_transform::Facing;
use facedeco_core::shared::constants::{APP_DIR_NAME, DEFAULT_SEQUENCE_FPS};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize settings for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no config directory available on this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Blend {
    /// Replace the pixels under the decoration.
    #[default]
    Src,
    /// Alpha-blend the decoration over what is already drawn.
    SrcOver,
}

impl From<Blend> for BlendMode {
    fn from(blend: Blend) -> Self {
        match blend {
            Blend::Src => BlendMode::Src,
            Blend::SrcOver => BlendMode::SrcOver,
        }
    }
}

/// Persisted defaults for the `facedeco` command. Command-line flags
/// override whatever is stored here.
///
/// Boolean switches only turn options on: a stored `true` stays on until
/// the file is edited or rewritten with `--save-settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Decoration image; the built-in glasses when unset.
    pub decoration: Option<PathBuf>,
    pub confidence: f64,
    pub skip_frames: usize,
    pub fps: f64,
    pub front_facing: bool,
    pub blend: Blend,
    pub preserve_aspect: bool,
    pub rotate_with_face: bool,
    pub show_box: bool,
    pub show_landmarks: bool,
    pub realtime: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            decoration: None,
            confidence: DEFAULT_CONFIDENCE,
            skip_frames: 1,
            fps: DEFAULT_SEQUENCE_FPS,
            front_facing: false,
            blend: Blend::Src,
            preserve_aspect: false,
            rotate_with_face: false,
            show_box: false,
            show_landmarks: false,
            realtime: false,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads an explicitly requested settings file. Missing or malformed
    /// files are errors.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` if given, otherwise the per-user file. A missing or
    /// unreadable per-user file falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let Some(path) = Self::default_path().filter(|p| p.exists()) else {
            return Ok(Self::default());
        };
        match Self::load_from(&path) {
            Ok(settings) => {
                log::debug!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) => {
                log::warn!("Ignoring {e}");
                Ok(Self::default())
            }
        }
    }

    /// Like [`Settings::load`], but a missing explicit file yields defaults
    /// so it can be created by a following [`Settings::save_to`].
    pub fn load_or_new(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) if !path.exists() => {
                log::debug!("{} does not exist yet, starting from defaults", path.display());
                Ok(Self::default())
            }
            _ => Self::load(explicit),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|source| SettingsError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, json).map_err(write_err)
    }

    pub fn facing(&self) -> Facing {
        if self.front_facing {
            Facing::Front
        } else {
            Facing::Back
        }
    }

    pub fn style(&self) -> DecorationStyle {
        DecorationStyle {
            blend: self.blend.into(),
            preserve_aspect: self.preserve_aspect,
            rotate_with_face: self.rotate_with_face,
            show_bounding_box: self.show_box,
            show_landmarks: self.show_landmarks,
        }
    }
}
