use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
    prelude::*,
};
use tracing::{debug, info};

use super::flow::{to_luma, FarnebackFlow, FlowEstimator, FlowField};
use crate::decoder::Frame;
use crate::error::{PipelineError, Result};

/// How motion arrows are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Spacing between arrow origins, in pixels.
    pub grid_step: usize,
    /// BGR.
    pub color: [u8; 3],
    pub thickness: i32,
    /// Arrowhead length relative to the shaft.
    pub tip_length: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            grid_step: 16,
            color: [0, 255, 0],
            thickness: 1,
            tip_length: 0.4,
        }
    }
}

/// Arrow origins: every `step` pixels from the top-left corner, row by row.
pub fn grid_points(width: i32, height: i32, step: usize) -> impl Iterator<Item = Point> {
    let step = step.max(1);
    (0..height.max(0))
        .step_by(step)
        .flat_map(move |y| (0..width.max(0)).step_by(step).map(move |x| Point::new(x, y)))
}

/// Draws motion vectors between each frame and its successor.
pub struct OverlayRenderer<E: FlowEstimator = FarnebackFlow> {
    estimator: E,
    style: OverlayStyle,
}

impl Default for OverlayRenderer<FarnebackFlow> {
    fn default() -> Self {
        Self::new(FarnebackFlow::default(), OverlayStyle::default())
    }
}

impl<E: FlowEstimator> OverlayRenderer<E> {
    pub fn new(estimator: E, style: OverlayStyle) -> Self {
        Self { estimator, style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Frame `i` (for `i < n - 1`) gets arrows computed against the original
    /// frame `i + 1`. The last frame passes through untouched. Sequences
    /// shorter than two frames are returned as-is.
    pub fn render(&self, frames: Vec<Frame>) -> Result<Vec<Frame>> {
        let n = frames.len();
        if n < 2 {
            return Ok(frames);
        }

        let mut out = Vec::with_capacity(n);
        let mut iter = frames.into_iter();
        let mut current = match iter.next() {
            Some(frame) => frame,
            None => return Ok(out),
        };
        let mut current_luma = to_luma(&current)?;

        for (index, next) in iter.enumerate() {
            let next_luma = to_luma(&next)?;
            let field = self.estimator.estimate(&current_luma, &next_luma)?;
            self.draw_field(current.mat_mut(), &field)?;
            debug!("overlaid motion on frame {}", index);
            out.push(current);

            current = next;
            current_luma = next_luma;
        }
        out.push(current);

        info!("rendered motion overlay on {} of {} frames", n - 1, n);
        Ok(out)
    }

    /// Draws one arrow per grid point of `field` onto `canvas`.
    pub fn draw_field(&self, canvas: &mut Mat, field: &FlowField) -> Result<()> {
        if field.width() != canvas.cols() || field.height() != canvas.rows() {
            return Err(PipelineError::DimensionMismatch {
                left_width: canvas.cols(),
                left_height: canvas.rows(),
                right_width: field.width(),
                right_height: field.height(),
            });
        }

        let [b, g, r] = self.style.color;
        let color = Scalar::new(b as f64, g as f64, r as f64, 0.0);

        for origin in grid_points(canvas.cols(), canvas.rows(), self.style.grid_step) {
            let (dx, dy) = field.at(origin.x, origin.y)?;
            // Truncate toward zero, matching integer pixel addressing.
            let tip = Point::new((origin.x as f32 + dx) as i32, (origin.y as f32 + dy) as i32);
            imgproc::arrowed_line(
                canvas,
                origin,
                tip,
                color,
                self.style.thickness,
                imgproc::LINE_8,
                0,
                self.style.tip_length,
            )?;
        }
        Ok(())
    }
}
