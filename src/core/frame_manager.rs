use opencv::{core::Vector, imgcodecs, prelude::*};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::decoder::Frame;
use crate::error::{PipelineError, Result};

const FRAME_PREFIX: &str = "image_";

/// Numbered still images in a directory, read back in file-name order.
///
/// The directory belongs to a single run; nothing else should write to it
/// while the run is active.
pub struct FrameManager {
    dir: PathBuf,
    extension: String,
}

impl FrameManager {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `image_00042.jpg` for index 42.
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}{:05}.{}", FRAME_PREFIX, index, self.extension))
    }

    /// Removes numbered images left by an earlier run.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.list()? {
            let numbered = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with(FRAME_PREFIX));
            if numbered {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("removed {} stale frames from {}", removed, self.dir.display());
        }
        Ok(removed)
    }

    pub fn write_all(&self, frames: &[Frame]) -> Result<Vec<PathBuf>> {
        let params = Vector::<i32>::new();
        let mut written = Vec::with_capacity(frames.len());
        for (index, frame) in frames.iter().enumerate() {
            let path = self.frame_path(index);
            let path_str = path_str(&path)?;
            if !imgcodecs::imwrite(path_str, frame.mat(), &params)? {
                return Err(PipelineError::Io(std::io::Error::other(format!(
                    "failed to encode {}",
                    path.display()
                ))));
            }
            written.push(path);
        }
        info!("wrote {} frames to {}", written.len(), self.dir.display());
        Ok(written)
    }

    /// Images with this manager's extension, sorted by file name.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map_or(false, |e| e == self.extension)
            })
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Decodes one image; `None` if the file cannot be read as a color image.
    pub fn load(&self, path: &Path) -> Result<Option<Frame>> {
        let mat = imgcodecs::imread(path_str(path)?, imgcodecs::IMREAD_COLOR)?;
        if mat.empty() {
            return Ok(None);
        }
        Frame::new(mat).map(Some)
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        PipelineError::Io(std::io::Error::other(format!(
            "path is not valid UTF-8: {}",
            path.display()
        )))
    })
}
