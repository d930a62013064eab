use std::fs;
use std::path::{Path, PathBuf};

use ndarray::prelude::*;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;
use serde::Deserialize;

use crate::{
    errors::{InferVizError, Result},
    traits::InferenceModel,
};

/// Topology manifest: the `.json` half of an uploaded model bundle. Declares
/// how to talk to the graph stored in the weight files.
#[derive(Deserialize, Debug, Clone)]
pub struct Manifest {
    pub input_name: String,
    pub output_name: String,
    /// Declared input signature; `-1` entries are dynamic.
    pub input_shape: Vec<i64>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| InferVizError::FileSystem {
            path: path.to_path_buf(),
            operation: "topology manifest read".to_string(),
            source: e,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// A user's model file selection, split by filename suffix: exactly one
/// `.json` topology manifest and one or more binary weight files. The first
/// weight file is the graph; any others are external-data shards that must
/// sit next to it.
pub struct ModelBundle {
    pub topology: PathBuf,
    pub weights: Vec<PathBuf>,
}

impl ModelBundle {
    pub fn from_files(files: &[PathBuf]) -> Result<Self> {
        let mut topology = None;
        let mut weights = Vec::new();

        for file in files {
            let is_json = file
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json {
                if topology.is_some() {
                    return Err(InferVizError::validation(
                        "model files",
                        "more than one .json topology file selected",
                    ));
                }
                topology = Some(file.clone());
            } else {
                weights.push(file.clone());
            }
        }

        let topology = topology.ok_or_else(|| {
            InferVizError::validation("model files", "no .json topology file selected")
        })?;
        if weights.is_empty() {
            return Err(InferVizError::validation(
                "model files",
                "no weight files selected",
            ));
        }

        Ok(Self { topology, weights })
    }

    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::from_file(&self.topology)
    }
}

/// A loaded model: the ort session plus the manifest that describes its I/O.
///
/// One handle is built per pipeline run and dropped when the run finishes;
/// nothing is cached across invocations, so a changed file selection is
/// always picked up.
pub struct Model {
    manifest: Manifest,
    session: Mutex<Session>,
}

impl Model {
    pub fn load(bundle: &ModelBundle, device_id: i32) -> Result<Self> {
        let manifest = bundle.manifest()?;

        // External-data shards are resolved by the runtime relative to the
        // graph file; report the missing ones ourselves for a usable error.
        for shard in &bundle.weights {
            if !shard.exists() {
                return Err(InferVizError::FileSystem {
                    path: shard.clone(),
                    operation: "weight file lookup".to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "weight file does not exist",
                    ),
                });
            }
        }

        let session = SessionBuilder::new()
            .map_err(|e| InferVizError::Model {
                operation: "session builder initialization".to_string(),
                source: Box::new(e),
            })?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| InferVizError::Model {
                operation: "execution provider registration".to_string(),
                source: Box::new(e),
            })?
            .with_memory_pattern(true)
            .map_err(|e| InferVizError::Model {
                operation: "memory pattern setup".to_string(),
                source: Box::new(e),
            })?
            .commit_from_file(&bundle.weights[0])
            .map_err(|e| InferVizError::Model {
                operation: format!("model load: {}", bundle.weights[0].display()),
                source: Box::new(e),
            })?;

        check_io_names(&session, &manifest)?;
        check_input_shape(&session, &manifest)?;

        Ok(Self {
            manifest,
            session: Mutex::new(session),
        })
    }

    pub const fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

impl InferenceModel for Model {
    fn predict(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![
            self.manifest.input_name.as_str() =>
                TensorRef::from_array_view(&input.as_standard_layout())?
        ])?;
        Ok(outputs[self.manifest.output_name.as_str()]
            .try_extract_array::<f32>()?
            .to_owned())
    }

    fn input_size(&self) -> Option<u32> {
        // NHWC image signature: [batch, H, W, C] with a concrete height.
        match self.manifest.input_shape.as_slice() {
            [_, h, _, _] if *h > 0 => Some(*h as u32),
            _ => None,
        }
    }
}

fn check_io_names(session: &Session, manifest: &Manifest) -> Result<()> {
    if !session
        .inputs
        .iter()
        .any(|input| input.name == manifest.input_name)
    {
        return Err(InferVizError::Model {
            operation: format!("input lookup: {}", manifest.input_name),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "weight files declare no such input",
            )),
        });
    }
    if !session
        .outputs
        .iter()
        .any(|output| output.name == manifest.output_name)
    {
        return Err(InferVizError::Model {
            operation: format!("output lookup: {}", manifest.output_name),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "weight files declare no such output",
            )),
        });
    }
    Ok(())
}

/// The manifest's declared input shape must agree with what the weight files
/// actually contain; `-1` on either side is a wildcard.
fn check_input_shape(session: &Session, manifest: &Manifest) -> Result<()> {
    let input = session
        .inputs
        .iter()
        .find(|input| input.name == manifest.input_name)
        .expect("input presence checked above");

    let declared = input
        .input_type
        .tensor_shape()
        .ok_or_else(|| InferVizError::Model {
            operation: "model input shape lookup".to_string(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "input is not a tensor",
            )),
        })?;

    let compatible = declared.len() == manifest.input_shape.len()
        && declared
            .iter()
            .zip(&manifest.input_shape)
            .all(|(&actual, &expected)| actual < 0 || expected < 0 || actual == expected);
    if !compatible {
        return Err(InferVizError::Model {
            operation: "topology/weight shape check".to_string(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "manifest declares {:?} but weights expect {:?}",
                    manifest.input_shape,
                    declared.iter().collect::<Vec<_>>()
                ),
            )),
        });
    }
    Ok(())
}
