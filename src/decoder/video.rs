use opencv::{core::Mat, prelude::*, videoio};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::frame_data::Frame;
use super::FrameSource;
use crate::core::fps_detector;
use crate::error::{PipelineError, Result};

/// Forward-only OpenCV decoder over a video file.
pub struct VideoDecoder {
    capture: videoio::VideoCapture,
    path: PathBuf,
    fps: Option<f64>,
    width: i32,
    height: i32,
    frame_count: Option<u64>,
}

impl VideoDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let unreadable = |reason: String| PipelineError::SourceUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(unreadable("no such file".into()));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| unreadable("path is not valid UTF-8".into()))?;

        // CAP_ANY lets OpenCV pick the backend (FFmpeg, GStreamer, built-in MJPEG)
        let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .map_err(|e| unreadable(e.to_string()))?;
        if !capture.is_opened()? {
            return Err(unreadable("no backend could open the stream".into()));
        }

        let raw_fps = capture.get(videoio::CAP_PROP_FPS)?;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        let raw_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;
        let frame_count = (raw_count.is_finite() && raw_count > 0.0).then(|| raw_count as u64);

        info!(
            "opened {} ({}x{}, {} fps, {:?} frames advertised)",
            path.display(),
            width,
            height,
            raw_fps,
            frame_count
        );

        Ok(Self {
            capture,
            path: path.to_path_buf(),
            fps: fps_detector::detect(raw_fps),
            width,
            height,
            frame_count,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Frame count from the container header; may be absent or approximate.
    pub fn advertised_frame_count(&self) -> Option<u64> {
        self.frame_count
    }
}

impl FrameSource for VideoDecoder {
    fn frame_rate(&self) -> Option<f64> {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        if !self.capture.read(&mut mat)? {
            return Ok(None); // EOF
        }
        if mat.empty() {
            return Ok(None);
        }
        debug!("decoded {}x{} frame", mat.cols(), mat.rows());
        Frame::new(mat).map(Some)
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        let _ = self.capture.release();
    }
}
