use opencv::{
    core::{self, Mat, Scalar, Vec2f},
    imgproc,
    prelude::*,
    video,
};

use crate::decoder::Frame;
use crate::error::{PipelineError, Result};

/// Dense per-pixel displacement between two frames, `CV_32FC2`.
pub struct FlowField {
    mat: Mat,
}

impl FlowField {
    pub fn from_mat(mat: Mat) -> Result<Self> {
        if mat.typ() != core::CV_32FC2 {
            return Err(PipelineError::InvalidFrame(format!(
                "flow field must be CV_32FC2, got type {}",
                mat.typ()
            )));
        }
        Ok(Self { mat })
    }

    /// Same displacement everywhere.
    pub fn uniform(width: i32, height: i32, dx: f32, dy: f32) -> Result<Self> {
        let value = Scalar::new(dx as f64, dy as f64, 0.0, 0.0);
        Self::from_mat(Mat::new_rows_cols_with_default(height, width, core::CV_32FC2, value)?)
    }

    pub fn width(&self) -> i32 {
        self.mat.cols()
    }

    pub fn height(&self) -> i32 {
        self.mat.rows()
    }

    /// `(dx, dy)` at pixel `(x, y)`.
    pub fn at(&self, x: i32, y: i32) -> Result<(f32, f32)> {
        let v = self.mat.at_2d::<Vec2f>(y, x)?;
        Ok((v[0], v[1]))
    }
}

/// Anything that can produce a dense flow field from two equal-sized
/// single-channel frames.
pub trait FlowEstimator {
    fn estimate(&self, prev: &Mat, next: &Mat) -> Result<FlowField>;
}

/// Polynomial-expansion parameters for [`FarnebackFlow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarnebackParams {
    pub pyr_scale: f64,
    pub levels: i32,
    pub window: i32,
    pub iterations: i32,
    pub poly_n: i32,
    pub poly_sigma: f64,
    pub flags: i32,
}

impl Default for FarnebackParams {
    fn default() -> Self {
        Self {
            pyr_scale: 0.5,
            levels: 3,
            window: 15,
            iterations: 3,
            poly_n: 5,
            poly_sigma: 1.2,
            flags: 0,
        }
    }
}

/// Gunnar Farneback dense optical flow. Deterministic for fixed inputs.
#[derive(Debug, Clone, Default)]
pub struct FarnebackFlow {
    pub params: FarnebackParams,
}

impl FarnebackFlow {
    pub fn new(params: FarnebackParams) -> Self {
        Self { params }
    }
}

impl FlowEstimator for FarnebackFlow {
    fn estimate(&self, prev: &Mat, next: &Mat) -> Result<FlowField> {
        if prev.cols() != next.cols() || prev.rows() != next.rows() {
            return Err(PipelineError::DimensionMismatch {
                left_width: prev.cols(),
                left_height: prev.rows(),
                right_width: next.cols(),
                right_height: next.rows(),
            });
        }

        let p = &self.params;
        let mut flow = Mat::default();
        video::calc_optical_flow_farneback(
            prev,
            next,
            &mut flow,
            p.pyr_scale,
            p.levels,
            p.window,
            p.iterations,
            p.poly_n,
            p.poly_sigma,
            p.flags,
        )?;
        FlowField::from_mat(flow)
    }
}

/// Single-channel luminance of a BGR frame.
pub fn to_luma(frame: &Frame) -> Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color_def(frame.mat(), &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Point, Size};

    /// Gray frame with a soft bright disc centred at `(cx, cy)`.
    fn blob(width: i32, height: i32, cx: i32, cy: i32) -> Mat {
        let mut img =
            Mat::new_rows_cols_with_default(height, width, core::CV_8UC1, Scalar::all(0.0)).unwrap();
        imgproc::circle(&mut img, Point::new(cx, cy), 12, Scalar::all(255.0), -1, imgproc::LINE_8, 0)
            .unwrap();
        let mut soft = Mat::default();
        imgproc::gaussian_blur_def(&img, &mut soft, Size::new(15, 15), 4.0).unwrap();
        soft
    }

    #[test]
    fn test_field_matches_input_size() {
        let a = blob(64, 48, 32, 24);
        let field = FarnebackFlow::default().estimate(&a, &a).unwrap();
        assert_eq!(field.width(), 64);
        assert_eq!(field.height(), 48);
    }

    #[test]
    fn test_identical_frames_have_no_motion() {
        let a = blob(64, 64, 32, 32);
        let field = FarnebackFlow::default().estimate(&a, &a).unwrap();
        for (x, y) in [(0, 0), (16, 16), (32, 32), (48, 20)] {
            let (dx, dy) = field.at(x, y).unwrap();
            assert!(dx.abs() < 0.01 && dy.abs() < 0.01, "({}, {}) -> ({}, {})", x, y, dx, dy);
        }
    }

    #[test]
    fn test_detects_horizontal_shift() {
        let a = blob(96, 96, 44, 48);
        let b = blob(96, 96, 47, 48);
        let field = FarnebackFlow::default().estimate(&a, &b).unwrap();

        // Left and right edges of the disc carry the gradient.
        let mut sum_dx = 0.0;
        let mut sum_dy = 0.0;
        for (x, y) in [(32, 48), (56, 48), (34, 46), (54, 50)] {
            let (dx, dy) = field.at(x, y).unwrap();
            sum_dx += dx;
            sum_dy += dy;
        }
        assert!(sum_dx / 4.0 > 1.0, "mean dx {}", sum_dx / 4.0);
        assert!((sum_dy / 4.0).abs() < 1.0, "mean dy {}", sum_dy / 4.0);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let a = blob(64, 64, 30, 30);
        let b = blob(64, 64, 33, 31);
        let est = FarnebackFlow::default();
        let f1 = est.estimate(&a, &b).unwrap();
        let f2 = est.estimate(&a, &b).unwrap();
        assert_eq!(f1.mat.data_bytes().unwrap(), f2.mat.data_bytes().unwrap());
    }

    #[test]
    fn test_rejects_mismatched_sizes() {
        let a = blob(32, 32, 16, 16);
        let b = blob(40, 32, 16, 16);
        assert!(matches!(
            FarnebackFlow::default().estimate(&a, &b),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_uniform_field() {
        let field = FlowField::uniform(8, 4, 2.5, -1.0).unwrap();
        assert_eq!(field.at(7, 3).unwrap(), (2.5, -1.0));
    }

    #[test]
    fn test_luma_is_single_channel() {
        let frame = Frame::filled(5, 4, [0, 0, 255]).unwrap();
        let gray = to_luma(&frame).unwrap();
        assert_eq!(gray.typ(), core::CV_8UC1);
        assert_eq!(gray.cols(), 5);
        assert_eq!(*gray.at_2d::<u8>(0, 0).unwrap(), 76);
    }
}
