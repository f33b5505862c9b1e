pub mod flow;
pub mod overlay;

pub use flow::{FarnebackFlow, FarnebackParams, FlowEstimator, FlowField};
pub use overlay::{OverlayRenderer, OverlayStyle};
