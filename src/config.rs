use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DEFAULT_OUTPUT_NAME: &str = "stopmotion.mp4";
pub const DEFAULT_IMAGE_EXT: &str = "jpg";

/// Everything one pipeline invocation needs. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_output_name")]
    pub output_name: String,
    pub target_fps: NonZeroU32,
    #[serde(default)]
    pub overlay: bool,
    /// Frame rate of the assembled video; the target rate when unset.
    #[serde(default)]
    pub output_fps: Option<NonZeroU32>,
    /// Keep the numbered intermediate images here instead of assembling in memory.
    #[serde(default)]
    pub frames_dir: Option<PathBuf>,
    #[serde(default = "default_image_ext")]
    pub image_ext: String,
}

fn default_output_name() -> String {
    DEFAULT_OUTPUT_NAME.to_string()
}

fn default_image_ext() -> String {
    DEFAULT_IMAGE_EXT.to_string()
}

impl RunParams {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, target_fps: NonZeroU32) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            output_name: default_output_name(),
            target_fps,
            overlay: false,
            output_fps: None,
            frames_dir: None,
            image_ext: default_image_ext(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_name)
    }

    pub fn effective_output_fps(&self) -> NonZeroU32 {
        self.output_fps.unwrap_or(self.target_fps)
    }
}

/// Output directory used when none is given: the platform video folder,
/// falling back to the working directory.
pub fn default_output_dir() -> PathBuf {
    dirs::video_dir().unwrap_or_else(|| PathBuf::from("."))
}
