//! Turns a video into a reduced-frame-rate stop-motion clip, optionally
//! drawing dense optical-flow arrows between consecutive kept frames.
//!
//! The stages run strictly in order: [`crate::core::sampler`] decimates the decoded
//! stream, [`crate::renderer::overlay`] draws motion vectors, and
//! [`crate::core::assembler`] re-encodes the frames at a constant rate.

pub mod config;
pub mod core;
pub mod decoder;
pub mod error;
pub mod logging;
pub mod renderer;

pub use config::RunParams;
pub use crate::core::pipeline::{probe, run, RunReport, SourceInfo};
pub use error::{PipelineError, Result};
