use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::assembler::{self, AssembledVideo, OutputCodec};
use super::fps_detector;
use super::frame_manager::FrameManager;
use super::sampler;
use crate::config::RunParams;
use crate::decoder::{FrameSource, VideoDecoder};
use crate::error::Result;
use crate::renderer::{FarnebackFlow, OverlayRenderer, OverlayStyle};

/// Values reported back after a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Detected source rate rounded to an integer; `None` when unknown.
    pub source_fps: Option<u32>,
    pub ratio: usize,
    pub decoded: usize,
    pub retained: usize,
    pub interrupted: bool,
    pub overlay: bool,
    pub output_fps: u32,
    pub written: usize,
    pub output: PathBuf,
}

/// Stream properties of a source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub fps: Option<f64>,
    pub rounded_fps: Option<u32>,
    pub frame_count: Option<u64>,
    pub width: i32,
    pub height: i32,
}

/// Sample, optionally overlay motion, and assemble the stop-motion video.
pub fn run(params: &RunParams) -> Result<RunReport> {
    let output = params.output_path();
    // Reject the container before any decoding work.
    OutputCodec::for_path(&output)?;

    let sampled = {
        let mut decoder = VideoDecoder::open(&params.input)?;
        sampler::sample(&mut decoder, params.target_fps)
    };

    let retained = sampled.frames.len();
    let frames = if params.overlay {
        OverlayRenderer::new(FarnebackFlow::default(), OverlayStyle::default())
            .render(sampled.frames)?
    } else {
        sampled.frames
    };

    fs::create_dir_all(&params.output_dir)?;
    let fps = params.effective_output_fps();

    let video: AssembledVideo = match &params.frames_dir {
        Some(dir) => {
            let store = FrameManager::new(dir, &params.image_ext)?;
            store.clear()?;
            let paths = store.write_all(&frames)?;
            drop(frames);
            assembler::assemble_paths(&store, &paths, &output, fps)?
        }
        None => assembler::assemble(frames, &output, fps)?,
    };

    info!(
        "source {:?} fps | kept {} frames | wrote {}",
        sampled.source_fps,
        retained,
        video.path.display()
    );

    Ok(RunReport {
        source_fps: sampled.source_fps,
        ratio: sampled.ratio,
        decoded: sampled.decoded,
        retained,
        interrupted: sampled.interrupted,
        overlay: params.overlay,
        output_fps: video.fps,
        written: video.frames_written,
        output: video.path,
    })
}

/// Opens `path` and reports its frame rate, size, and advertised length.
pub fn probe(path: &Path) -> Result<SourceInfo> {
    let decoder = VideoDecoder::open(path)?;
    let fps = decoder.frame_rate();
    Ok(SourceInfo {
        path: decoder.path().to_path_buf(),
        fps,
        rounded_fps: fps_detector::reported_fps(fps),
        frame_count: decoder.advertised_frame_count(),
        width: decoder.width(),
        height: decoder.height(),
    })
}
