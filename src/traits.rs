use crate::errors::Result;
use ndarray::prelude::*;

/// Abstraction over a loaded model so pipelines can run against the ONNX
/// session in production and against mocks in tests.
pub trait InferenceModel: Send + Sync {
    /// Execute one forward pass. Accepted call shapes are a 1-D vector
    /// (regression) and a 4-D NHWC image batch (classification and
    /// segmentation); anything the model cannot take is rejected by the
    /// runtime as a model error.
    fn predict(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>>;

    /// Spatial working resolution declared by the model's input signature,
    /// `None` for vector models.
    fn input_size(&self) -> Option<u32>;
}
