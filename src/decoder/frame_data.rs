use opencv::{
    core::{self, Mat, Scalar, Vec3b},
    prelude::*,
};

use crate::error::{PipelineError, Result};

/// A decoded video frame: 8-bit, 3-channel BGR pixels.
pub struct Frame {
    mat: Mat,
}

impl Frame {
    pub fn new(mat: Mat) -> Result<Self> {
        if mat.empty() {
            return Err(PipelineError::InvalidFrame("empty image".into()));
        }
        if mat.typ() != core::CV_8UC3 {
            return Err(PipelineError::InvalidFrame(format!(
                "expected 8-bit 3-channel pixels, got type {}",
                mat.typ()
            )));
        }
        Ok(Self { mat })
    }

    /// Solid frame in the given BGR color.
    pub fn filled(width: i32, height: i32, bgr: [u8; 3]) -> Result<Self> {
        let color = Scalar::new(bgr[0] as f64, bgr[1] as f64, bgr[2] as f64, 0.0);
        let mat = Mat::new_rows_cols_with_default(height, width, core::CV_8UC3, color)?;
        Self::new(mat)
    }

    pub fn width(&self) -> i32 {
        self.mat.cols()
    }

    pub fn height(&self) -> i32 {
        self.mat.rows()
    }

    pub fn mat(&self) -> &Mat {
        &self.mat
    }

    pub fn mat_mut(&mut self) -> &mut Mat {
        &mut self.mat
    }

    pub fn into_mat(self) -> Mat {
        self.mat
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            mat: self.mat.try_clone()?,
        })
    }

    /// Raw pixel bytes, row-major BGR.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        if !self.mat.is_continuous() {
            return Err(PipelineError::InvalidFrame("frame data is not continuous".into()));
        }
        Ok(self.mat.data_bytes()?)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Result<[u8; 3]> {
        let px = self.mat.at_2d::<Vec3b>(y, x)?;
        Ok([px[0], px[1], px[2]])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, bgr: [u8; 3]) -> Result<()> {
        let px = self.mat.at_2d_mut::<Vec3b>(y, x)?;
        px[0] = bgr[0];
        px[1] = bgr[1];
        px[2] = bgr[2];
        Ok(())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_frame_dimensions_and_color() {
        let frame = Frame::filled(4, 3, [10, 20, 30]).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.pixel(3, 2).unwrap(), [10, 20, 30]);
        assert_eq!(frame.as_bytes().unwrap().len(), 4 * 3 * 3);
    }

    #[test]
    fn test_rejects_single_channel() {
        let gray = Mat::new_rows_cols_with_default(2, 2, core::CV_8UC1, Scalar::all(0.0)).unwrap();
        assert!(matches!(Frame::new(gray), Err(PipelineError::InvalidFrame(_))));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(Frame::new(Mat::default()).is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = Frame::filled(2, 2, [0, 0, 0]).unwrap();
        let b = a.try_clone().unwrap();
        a.set_pixel(0, 0, [255, 255, 255]).unwrap();
        assert_eq!(b.pixel(0, 0).unwrap(), [0, 0, 0]);
        assert_eq!(a.pixel(0, 0).unwrap(), [255, 255, 255]);
    }
}
