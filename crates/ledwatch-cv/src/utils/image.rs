//! Frame helpers over OpenCV

use crate::Result;
use anyhow::Context;
use opencv::{
    core::{Mat, Size, Vector},
    imgcodecs, imgproc,
    prelude::*,
};
use std::path::Path;

/// Frame utility functions
pub struct FrameUtils;

impl FrameUtils {
    /// Resize `frame` to `width`x`height` unless it already has that size
    pub fn fit(frame: Mat, width: i32, height: i32) -> Result<Mat> {
        let size = frame.size()?;
        if size.width == width && size.height == height {
            return Ok(frame);
        }

        let mut resized = Mat::default();
        imgproc::resize(
            &frame,
            &mut resized,
            Size::new(width, height),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )
        .context("Failed to resize frame")?;
        Ok(resized)
    }

    /// Save Mat as image
    pub fn save<P: AsRef<Path>>(mat: &Mat, path: P) -> Result<()> {
        let path_str = path.as_ref().to_string_lossy();

        imgcodecs::imwrite(&path_str, mat, &Vector::new())
            .with_context(|| format!("Failed to save image: {}", path_str))?;

        Ok(())
    }
}
