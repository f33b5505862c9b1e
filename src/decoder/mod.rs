pub mod frame_data;
pub mod video;

pub use frame_data::Frame;
pub use video::VideoDecoder;

use crate::error::Result;

/// A forward-only stream of decoded frames.
pub trait FrameSource {
    /// Native frame rate, `None` when unknown or not positive.
    fn frame_rate(&self) -> Option<f64>;

    /// Next frame in decode order. `Ok(None)` marks end of data.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}
