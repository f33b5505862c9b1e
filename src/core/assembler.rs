use opencv::{
    core::{Mat, Size},
    imgproc,
    prelude::*,
    videoio::VideoWriter,
};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::frame_manager::FrameManager;
use crate::decoder::Frame;
use crate::error::{PipelineError, Result};

/// Codec/container pairing picked from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCodec {
    /// MPEG-4 Part 2 in an MP4/MOV container.
    Mp4v,
    /// Motion JPEG in AVI; always available through OpenCV's built-in writer.
    Mjpg,
}

impl OutputCodec {
    pub fn for_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mp4" | "m4v" | "mov" => Ok(Self::Mp4v),
            "avi" => Ok(Self::Mjpg),
            _ => Err(PipelineError::UnsupportedContainer(path.display().to_string())),
        }
    }

    pub fn fourcc(self) -> Result<i32> {
        let code = match self {
            Self::Mp4v => VideoWriter::fourcc('m', 'p', '4', 'v')?,
            Self::Mjpg => VideoWriter::fourcc('M', 'J', 'P', 'G')?,
        };
        Ok(code)
    }
}

/// Result of a successful assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledVideo {
    pub path: PathBuf,
    pub frames_written: usize,
    pub width: i32,
    pub height: i32,
    pub fps: u32,
}

/// Open writer sized to the first frame it was given.
struct SequenceWriter {
    writer: VideoWriter,
    size: Size,
    written: usize,
}

impl SequenceWriter {
    fn open(output: &Path, codec: OutputCodec, fps: NonZeroU32, first: &Frame) -> Result<Self> {
        let size = Size::new(first.width(), first.height());
        let path_str = output
            .to_str()
            .ok_or_else(|| PipelineError::WriterUnavailable(output.to_path_buf()))?;
        let writer = VideoWriter::new(path_str, codec.fourcc()?, fps.get() as f64, size, true)?;
        if !writer.is_opened()? {
            return Err(PipelineError::WriterUnavailable(output.to_path_buf()));
        }
        debug!("opened {:?} writer {}x{} @ {} fps", codec, size.width, size.height, fps);
        Ok(Self {
            writer,
            size,
            written: 0,
        })
    }

    /// Writes `frame`, stretching it to the first frame's size when needed.
    fn push(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() == self.size.width && frame.height() == self.size.height {
            self.writer.write(frame.mat())?;
        } else {
            let mut resized = Mat::default();
            imgproc::resize(frame.mat(), &mut resized, self.size, 0.0, 0.0, imgproc::INTER_LINEAR)?;
            debug!(
                "resized frame {} from {}x{}",
                self.written,
                frame.width(),
                frame.height()
            );
            self.writer.write(&resized)?;
        }
        self.written += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<(usize, Size)> {
        self.writer.release()?;
        Ok((self.written, self.size))
    }
}

/// Encodes `frames` in order into `output` at a constant `fps`.
///
/// Every frame is stretched to the first frame's dimensions. Fails with
/// [`PipelineError::EmptySequence`] without creating a file when there is
/// nothing to write.
pub fn assemble<I>(frames: I, output: &Path, fps: NonZeroU32) -> Result<AssembledVideo>
where
    I: IntoIterator<Item = Frame>,
{
    let codec = OutputCodec::for_path(output)?;
    let mut frames = frames.into_iter();
    let first = frames.next().ok_or(PipelineError::EmptySequence)?;

    let mut writer = SequenceWriter::open(output, codec, fps, &first)?;
    writer.push(&first)?;
    drop(first);
    for frame in frames {
        writer.push(&frame)?;
    }
    finish(writer, output, fps)
}

/// Like [`assemble`], reading the images of `store` in file-name order.
///
/// Files that cannot be decoded are skipped.
pub fn assemble_dir(store: &FrameManager, output: &Path, fps: NonZeroU32) -> Result<AssembledVideo> {
    let files = store.list()?;
    assemble_paths(store, &files, output, fps)
}

/// Encodes exactly `paths`, in the order given, decoding each through `store`.
///
/// Files that cannot be decoded are skipped.
pub fn assemble_paths(
    store: &FrameManager,
    paths: &[PathBuf],
    output: &Path,
    fps: NonZeroU32,
) -> Result<AssembledVideo> {
    let codec = OutputCodec::for_path(output)?;
    if paths.is_empty() {
        return Err(PipelineError::EmptySequence);
    }

    let mut writer: Option<SequenceWriter> = None;
    for path in paths {
        let frame = match store.load(path)? {
            Some(frame) => frame,
            None => {
                warn!("skipping unreadable image {}", path.display());
                continue;
            }
        };
        match writer.as_mut() {
            Some(w) => w.push(&frame)?,
            None => {
                let mut w = SequenceWriter::open(output, codec, fps, &frame)?;
                w.push(&frame)?;
                writer = Some(w);
            }
        }
    }

    match writer {
        Some(w) => finish(w, output, fps),
        None => Err(PipelineError::EmptySequence),
    }
}

fn finish(writer: SequenceWriter, output: &Path, fps: NonZeroU32) -> Result<AssembledVideo> {
    let (frames_written, size) = writer.finish()?;
    info!(
        "assembled {} frames ({}x{} @ {} fps) into {}",
        frames_written,
        size.width,
        size.height,
        fps,
        output.display()
    );
    Ok(AssembledVideo {
        path: output.to_path_buf(),
        frames_written,
        width: size.width,
        height: size.height,
        fps: fps.get(),
    })
}
