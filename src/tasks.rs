use std::fmt;
use std::fs;
use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GrayImage, ImageFormat, RgbImage};
use ndarray::prelude::*;

use crate::{
    errors::{InferVizError, Result},
    model::{Model, ModelBundle},
    plot::{render_scatter, ScatterData},
    postprocess::postprocess,
    tensor::{image_to_tensor, load_image_tensor, open_image, tensor_to_image},
    traits::InferenceModel,
};

const PLOT_WIDTH: u32 = 640;
const PLOT_HEIGHT: u32 = 480;

/// Complete result set of one regression run; written out only as a whole.
pub struct RegressionOutput {
    pub data: ScatterData,
    pub plot: RgbImage,
}

/// Complete result set of one classification run.
pub struct ClassificationOutput {
    pub class_name: String,
    pub confidence: f32,
    pub image: DynamicImage,
}

impl fmt::Display for ClassificationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2}%", self.class_name, self.confidence * 100.0)
    }
}

impl ClassificationOutput {
    /// Write the full display set: the uploaded image alongside the
    /// prediction text, as one batch after the pipeline succeeded.
    pub fn write_to(&self, dir: &Path, format: ImageFormat) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| InferVizError::FileSystem {
            path: dir.to_path_buf(),
            operation: "output directory creation".to_string(),
            source: e,
        })?;

        let extension = format.extensions_str().first().copied().unwrap_or("png");
        let image_path = dir.join("image").with_extension(extension);
        self.image
            .save_with_format(&image_path, format)
            .map_err(|e| InferVizError::ImageProcessing {
                path: image_path.display().to_string(),
                operation: "image save".to_string(),
                source: Box::new(e),
            })?;

        let text_path = dir.join("prediction.txt");
        std::fs::write(&text_path, format!("{}\n", self)).map_err(|e| {
            InferVizError::FileSystem {
                path: text_path,
                operation: "prediction write".to_string(),
                source: e,
            }
        })
    }
}

/// Complete result set of one segmentation run: the source image, the
/// optional annotation shown next to it, and the rendered label mask at the
/// source dimensions.
pub struct SegmentationOutput {
    pub image: DynamicImage,
    pub annotation: Option<DynamicImage>,
    pub mask: GrayImage,
}

/// One prediction pipeline around a loaded model. Each run is strictly
/// sequential and owns its tensors; intermediate buffers die with their
/// scope, and the final artifacts come back as one bundle so callers can
/// update every output at once or not at all.
pub struct Pipeline<M: InferenceModel> {
    model: M,
}

impl<M: InferenceModel> Pipeline<M> {
    pub const fn new(model: M) -> Self {
        Self { model }
    }

    /// Vector in, vector out, scatter plot of inputs against predictions.
    pub fn run_regression(&self, xs: &[f32]) -> Result<RegressionOutput> {
        let input = Array1::from(xs.to_vec()).into_dyn();
        let output = self.model.predict(input.view())?;
        drop(input);

        let ys: Vec<f32> = output.iter().copied().collect();
        let data = ScatterData::new(xs.to_vec(), ys)?;
        let plot = render_scatter(&data, PLOT_WIDTH, PLOT_HEIGHT)?;
        Ok(RegressionOutput { data, plot })
    }

    /// Image in, class-probability vector out; reports the arg-max class by
    /// name with its confidence.
    pub fn run_classification(
        &self,
        image_path: &Path,
        labels_path: &Path,
    ) -> Result<ClassificationOutput> {
        let class_names = load_class_labels(labels_path)?;
        let image = open_image(image_path)?;

        let probabilities = {
            let input = self.prepare_image_batch(&image)?;
            let output = self.model.predict(input.view())?;
            output.iter().copied().collect::<Vec<f32>>()
        };

        let (index, confidence) = argmax(&probabilities).ok_or_else(|| {
            InferVizError::validation("model output", "probability vector is empty")
        })?;
        let class_name = class_names.get(index).cloned().ok_or_else(|| {
            InferVizError::validation(
                "label file",
                format!(
                    "class index {} out of range for {} labels",
                    index,
                    class_names.len()
                ),
            )
        })?;

        Ok(ClassificationOutput {
            class_name,
            confidence,
            image,
        })
    }

    /// Image in, dense per-pixel output postprocessed into a label mask at
    /// the source image's dimensions.
    pub fn run_segmentation(
        &self,
        image_path: &Path,
        annotation_path: Option<&Path>,
    ) -> Result<SegmentationOutput> {
        let image = open_image(image_path)?;
        // The annotation travels the single-channel tensor path so it
        // displays as greyscale next to the greyscale prediction mask.
        let annotation = annotation_path
            .map(|path| -> Result<DynamicImage> {
                let tensor = load_image_tensor(path, 1)?;
                tensor_to_image(tensor.view())
            })
            .transpose()?;
        let (width, height) = (image.width(), image.height());

        let raw = {
            let input = self.prepare_image_batch(&image)?;
            self.model.predict(input.view())?
        };
        let raw = strip_batch_axis(raw);

        let mask = postprocess(raw.view(), (width, height))?;
        Ok(SegmentationOutput {
            image,
            annotation,
            mask,
        })
    }

    /// Resize to the model's working resolution and pack into an NHWC batch
    /// of one.
    fn prepare_image_batch(&self, image: &DynamicImage) -> Result<ArrayD<f32>> {
        let size = self.model.input_size().ok_or_else(|| {
            InferVizError::validation("model", "declares no image input signature")
        })?;
        let resized = image.resize_exact(size, size, FilterType::Lanczos3);
        let tensor = image_to_tensor(&resized, 3)?;
        Ok(tensor.insert_axis(Axis(0)).into_dyn())
    }
}

impl Pipeline<Model> {
    /// Load the model bundle from the current file selection. A fresh handle
    /// per run, nothing cached: a changed selection always takes effect.
    pub fn with_model_files(files: &[std::path::PathBuf], device_id: i32) -> Result<Self> {
        let bundle = ModelBundle::from_files(files)?;
        let model = Model::load(&bundle, device_id)?;
        Ok(Self::new(model))
    }
}

/// Class names for classification: a JSON array of strings indexed by output
/// class index.
pub fn load_class_labels(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| InferVizError::FileSystem {
        path: path.to_path_buf(),
        operation: "label file read".to_string(),
        source: e,
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, best_v)) if best_v >= v => best,
            _ => Some((i, v)),
        })
}

/// Model outputs arrive as `[1, H, W, 1]`; peel the batch axis so the
/// post-processor sees the `[H, W, 1]` contract. Outputs already at rank 3
/// pass through; anything else is caught by the post-processor's own check.
fn strip_batch_axis(raw: ArrayD<f32>) -> ArrayD<f32> {
    if raw.ndim() == 4 && raw.shape()[0] == 1 {
        raw.index_axis_move(Axis(0), 0)
    } else {
        raw
    }
}
