pub mod assembler;
pub mod fps_detector;
pub mod frame_manager;
pub mod pipeline;
pub mod sampler;
