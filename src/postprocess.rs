use image::{imageops, imageops::FilterType, GrayImage, ImageBuffer, Luma};
use imageproc::map::map_colors;
use ndarray::prelude::*;

use crate::errors::{InferVizError, Result};
use crate::labeling::label_components;
use crate::morphology::{open, BACKGROUND, FOREGROUND};

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Threshold raw per-pixel scores into a binary mask: sigmoid then a strict
/// `> 0.5` comparison, 255 for foreground and 0 for background.
pub fn threshold_mask(raw: ArrayView2<f32>) -> GrayImage {
    let (height, width) = raw.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let score = sigmoid(raw[[y as usize, x as usize]]);
        Luma([if score > 0.5 { FOREGROUND } else { BACKGROUND }])
    })
}

/// Turn a model's dense per-pixel output into a displayable label-mask image.
///
/// Steps, each a pure transform: sigmoid + threshold, erode (9x9), dilate
/// (5x5), connected-component labeling, bilinear rescale to
/// `original_dimensions` (`(width, height)`), and a linear rescale of label
/// values into `[0, 255]` so distinct components are visually apart.
/// Rescaling labels bilinearly is a known categorical approximation carried
/// over from the reference behavior.
///
/// `raw` must be `[H, W, 1]`; anything else is a caller contract violation
/// and fails fast rather than being silently reshaped. A mask with no
/// surviving foreground renders uniformly black.
pub fn postprocess(raw: ArrayViewD<'_, f32>, original_dimensions: (u32, u32)) -> Result<GrayImage> {
    if raw.ndim() != 3 {
        return Err(InferVizError::validation(
            "raw output",
            format!("expected rank 3 [H, W, 1], got rank {}", raw.ndim()),
        ));
    }
    let raw = raw.into_dimensionality::<Ix3>()?;
    if raw.dim().2 != 1 {
        return Err(InferVizError::validation(
            "raw output",
            format!("expected a single channel, got {}", raw.dim().2),
        ));
    }

    let scores = raw.index_axis(Axis(2), 0);
    let mask = threshold_mask(scores);
    let opened = open(&mask);
    let (labels, max_label) = label_components(&opened);

    let (width, height) = original_dimensions;
    if max_label == 0 {
        return Ok(GrayImage::new(width, height));
    }

    // Carry label values through the resize as floats, the same way the
    // working-resolution mask would travel back to display size.
    let (label_h, label_w) = labels.dim();
    let label_image: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_raw(
        label_w as u32,
        label_h as u32,
        labels.iter().map(|&l| l as f32).collect(),
    )
    .ok_or_else(|| InferVizError::validation("label mask", "buffer/shape mismatch"))?;
    let resized = imageops::resize(&label_image, width, height, FilterType::Triangle);

    let scale = (255 / max_label) as f32;
    Ok(map_colors(&resized, |Luma([label])| {
        Luma([(label * scale).round().clamp(0.0, 255.0) as u8])
    }))
}
