use ndarray::prelude::*;

use crate::errors::Result;
use crate::traits::InferenceModel;

/// Mock vector model: adds a fixed offset to every input element, standing in
/// for the linear regressor.
#[derive(Debug, Clone)]
pub struct MockLinearModel {
    pub offset: f32,
}

impl MockLinearModel {
    pub const fn new(offset: f32) -> Self {
        Self { offset }
    }
}

impl InferenceModel for MockLinearModel {
    fn predict(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        Ok(input.map(|&x| x + self.offset))
    }

    fn input_size(&self) -> Option<u32> {
        None
    }
}

/// Mock classifier: ignores the input and returns a fixed probability vector.
#[derive(Debug, Clone)]
pub struct MockClassifierModel {
    pub image_size: u32,
    pub probabilities: Vec<f32>,
}

impl MockClassifierModel {
    pub fn new(image_size: u32, probabilities: Vec<f32>) -> Self {
        Self {
            image_size,
            probabilities,
        }
    }
}

impl InferenceModel for MockClassifierModel {
    fn predict(&self, _input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        Ok(Array1::from(self.probabilities.clone())
            .insert_axis(Axis(0))
            .into_dyn())
    }

    fn input_size(&self) -> Option<u32> {
        Some(self.image_size)
    }
}

/// Mock segmenter: ignores the input and returns a fixed raw `[H, W, 1]`
/// score map with a batch axis, shaped like the dense model output.
#[derive(Debug, Clone)]
pub struct MockSegmentationModel {
    pub image_size: u32,
    raw: Array3<f32>,
}

impl MockSegmentationModel {
    /// All scores at a constant value; negative values yield an empty mask.
    pub fn uniform(image_size: u32, score: f32) -> Self {
        let size = image_size as usize;
        Self {
            image_size,
            raw: Array3::from_elem((size, size, 1), score),
        }
    }

    pub fn with_raw(image_size: u32, raw: Array3<f32>) -> Self {
        Self { image_size, raw }
    }
}

impl InferenceModel for MockSegmentationModel {
    fn predict(&self, _input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        Ok(self.raw.clone().insert_axis(Axis(0)).into_dyn())
    }

    fn input_size(&self) -> Option<u32> {
        Some(self.image_size)
    }
}
