pub mod config;
pub mod errors;
pub mod labeling;
pub mod model;
pub mod morphology;
pub mod plot;
pub mod postprocess;
pub mod tasks;
pub mod tensor;
pub mod traits;

pub mod mocks;

pub use config::{Config, Task};
pub use errors::{InferVizError, Result};
pub use model::{Manifest, Model, ModelBundle};
pub use plot::ScatterData;
pub use tasks::{ClassificationOutput, Pipeline, RegressionOutput, SegmentationOutput};
pub use traits::InferenceModel;
