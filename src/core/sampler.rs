use std::num::NonZeroU32;
use tracing::{info, warn};

use super::fps_detector;
use crate::decoder::{Frame, FrameSource};

/// Frames kept by [`sample`] plus the values reported back to the caller.
#[derive(Debug)]
pub struct SampledFrames {
    pub frames: Vec<Frame>,
    pub ratio: usize,
    pub source_fps: Option<u32>,
    /// Frames read from the source, kept or not.
    pub decoded: usize,
    /// Sampling stopped on a decode error rather than end of stream.
    pub interrupted: bool,
}

/// Reads `source` to the end, keeping frame `i` iff `i % ratio == 0`.
///
/// A decode error ends sampling early; whatever was kept up to that point is
/// returned.
pub fn sample<S: FrameSource + ?Sized>(source: &mut S, target_fps: NonZeroU32) -> SampledFrames {
    let source_rate = source.frame_rate();
    let ratio = fps_detector::sampling_ratio(source_rate, target_fps);
    if source_rate.is_none() {
        warn!("source frame rate unknown; keeping every frame");
    }

    let mut frames = Vec::new();
    let mut index = 0usize;
    let mut interrupted = false;

    loop {
        match source.next_frame() {
            Ok(Some(frame)) => {
                if index % ratio == 0 {
                    frames.push(frame);
                }
                index += 1;
            }
            Ok(None) => break,
            Err(e) => {
                warn!("decode failed at frame {}: {}; keeping {} frames", index, e, frames.len());
                interrupted = true;
                break;
            }
        }
    }

    let source_fps = fps_detector::reported_fps(source_rate);
    info!(
        "sampled {} of {} frames (ratio {}, source {:?} fps, target {} fps)",
        frames.len(),
        index,
        ratio,
        source_fps,
        target_fps
    );

    SampledFrames {
        frames,
        ratio,
        source_fps,
        decoded: index,
        interrupted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, Result};

    /// In-memory source; frame `i` is a 1x1 frame encoding `i` in blue/green.
    struct SyntheticSource {
        fps: Option<f64>,
        len: usize,
        fail_at: Option<usize>,
        next: usize,
    }

    impl SyntheticSource {
        fn new(fps: Option<f64>, len: usize) -> Self {
            Self { fps, len, fail_at: None, next: 0 }
        }
    }

    impl FrameSource for SyntheticSource {
        fn frame_rate(&self) -> Option<f64> {
            self.fps
        }

        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if Some(self.next) == self.fail_at {
                return Err(PipelineError::InvalidFrame("corrupt packet".into()));
            }
            if self.next >= self.len {
                return Ok(None);
            }
            let frame = Frame::filled(1, 1, [(self.next % 256) as u8, (self.next / 256) as u8, 0])?;
            self.next += 1;
            Ok(Some(frame))
        }
    }

    fn nz(v: u32) -> NonZeroU32 {
        NonZeroU32::new(v).unwrap()
    }

    fn indices(sampled: &SampledFrames) -> Vec<usize> {
        sampled
            .frames
            .iter()
            .map(|f| {
                let px = f.pixel(0, 0).unwrap();
                px[0] as usize + px[1] as usize * 256
            })
            .collect()
    }

    #[test]
    fn test_thirty_to_ten_keeps_every_third() {
        let mut src = SyntheticSource::new(Some(30.0), 300);
        let sampled = sample(&mut src, nz(10));
        assert_eq!(sampled.ratio, 3);
        assert_eq!(sampled.frames.len(), 100);
        assert_eq!(sampled.decoded, 300);
        assert_eq!(sampled.source_fps, Some(30));
        assert!(!sampled.interrupted);
        assert_eq!(indices(&sampled), (0..300).step_by(3).collect::<Vec<_>>());
    }

    #[test]
    fn test_twenty_four_to_twelve_short_clip() {
        let mut src = SyntheticSource::new(Some(24.0), 5);
        let sampled = sample(&mut src, nz(12));
        assert_eq!(sampled.ratio, 2);
        assert_eq!(indices(&sampled), vec![0, 2, 4]);
    }

    #[test]
    fn test_retained_count_is_ceiling() {
        for (len, fps, target) in [(7usize, 30.0, 10u32), (9, 30.0, 10), (10, 60.0, 12), (1, 24.0, 4)] {
            let mut src = SyntheticSource::new(Some(fps), len);
            let sampled = sample(&mut src, nz(target));
            let r = sampled.ratio;
            assert_eq!(sampled.frames.len(), (len + r - 1) / r, "len={} ratio={}", len, r);
        }
    }

    #[test]
    fn test_source_shorter_than_ratio_keeps_first() {
        let mut src = SyntheticSource::new(Some(60.0), 3);
        let sampled = sample(&mut src, nz(4));
        assert_eq!(sampled.ratio, 15);
        assert_eq!(indices(&sampled), vec![0]);
    }

    #[test]
    fn test_empty_source() {
        let mut src = SyntheticSource::new(Some(30.0), 0);
        let sampled = sample(&mut src, nz(10));
        assert!(sampled.frames.is_empty());
        assert_eq!(sampled.decoded, 0);
    }

    #[test]
    fn test_unknown_rate_keeps_every_frame() {
        let mut src = SyntheticSource::new(None, 6);
        let sampled = sample(&mut src, nz(8));
        assert_eq!(sampled.ratio, 1);
        assert_eq!(sampled.source_fps, None);
        assert_eq!(sampled.frames.len(), 6);
    }

    #[test]
    fn test_decode_error_ends_sampling_softly() {
        let mut src = SyntheticSource::new(Some(30.0), 30);
        src.fail_at = Some(10);
        let sampled = sample(&mut src, nz(10));
        assert!(sampled.interrupted);
        assert_eq!(sampled.decoded, 10);
        assert_eq!(indices(&sampled), vec![0, 3, 6, 9]);
    }
}
