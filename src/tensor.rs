use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::prelude::*;
use nshare::AsNdarray3;
use num_traits::clamp;

use crate::errors::{InferVizError, Result};

/// Pack a decoded image into an `[H, W, C]` tensor with samples in `[0, 1]`.
///
/// `desired_channels` selects the pixel layout: 3 converts to RGB, 1 to
/// greyscale. Anything else has no counterpart in the display path and is
/// rejected.
pub fn image_to_tensor(img: &DynamicImage, desired_channels: u32) -> Result<Array3<f32>> {
    match desired_channels {
        3 => {
            let rgb = img.to_rgb8();
            // nshare exposes the buffer as [C, H, W]; permute into [H, W, C].
            let tensor = rgb
                .as_ndarray3()
                .permuted_axes([1, 2, 0])
                .map(|&v| f32::from(v) / 255.0);
            Ok(tensor)
        }
        1 => {
            let gray = img.to_luma8();
            let (width, height) = gray.dimensions();
            let plane = Array2::from_shape_vec((height as usize, width as usize), gray.into_raw())?
                .map(|&v| f32::from(v) / 255.0);
            Ok(plane.insert_axis(Axis(2)))
        }
        other => Err(InferVizError::validation(
            "desired_channels",
            format!("must be 1 (greyscale) or 3 (RGB), got {}", other),
        )),
    }
}

/// Inverse of [`image_to_tensor`]: clamp each sample to `[0, 1]`, scale to
/// `[0, 255]` and round. C=1 renders greyscale, C=3 renders RGB.
pub fn tensor_to_image(tensor: ArrayView3<f32>) -> Result<DynamicImage> {
    let (height, width, channels) = tensor.dim();
    let samples: Vec<u8> = tensor
        .as_standard_layout()
        .iter()
        .map(|&v| (clamp(v, 0.0, 1.0) * 255.0).round() as u8)
        .collect();

    match channels {
        3 => {
            let buffer = RgbImage::from_raw(width as u32, height as u32, samples)
                .ok_or_else(|| InferVizError::validation("tensor", "buffer/shape mismatch"))?;
            Ok(DynamicImage::ImageRgb8(buffer))
        }
        1 => {
            let buffer = GrayImage::from_raw(width as u32, height as u32, samples)
                .ok_or_else(|| InferVizError::validation("tensor", "buffer/shape mismatch"))?;
            Ok(DynamicImage::ImageLuma8(buffer))
        }
        other => Err(InferVizError::validation(
            "tensor",
            format!("channel count must be 1 or 3, got {}", other),
        )),
    }
}

/// Decode an image file and pack it into a tensor in one step.
pub fn load_image_tensor(path: &Path, desired_channels: u32) -> Result<Array3<f32>> {
    let img = open_image(path)?;
    image_to_tensor(&img, desired_channels)
}

pub fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| InferVizError::ImageProcessing {
        path: path.display().to_string(),
        operation: "image decode".to_string(),
        source: Box::new(e),
    })
}
