use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use infer_viz_rs::{Config, Pipeline, Task};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = Config::parse();

    for file in &config.model_files {
        ensure!(
            file.exists(),
            "Model file does not exist: {}",
            file.display()
        );
    }

    // A run with missing inputs never starts a pipeline; it warns and leaves
    // everything untouched. Failures past this point propagate as errors.
    match config.task {
        Task::Regression => {
            let Some(values) = config.values.clone() else {
                warn!("regression needs --values; nothing to do");
                return Ok(());
            };
            run_regression(&config, &values)
        }
        Task::Classification => {
            let (Some(data), Some(labels)) = (config.data.clone(), config.labels.clone()) else {
                warn!("classification needs --data and --labels; nothing to do");
                return Ok(());
            };
            run_classification(&config, &data, &labels)
        }
        Task::Segmentation => {
            let Some(data) = config.data.clone() else {
                warn!("segmentation needs --data; nothing to do");
                return Ok(());
            };
            run_segmentation(&config, &data, config.labels.as_deref())
        }
    }
}

fn run_regression(config: &Config, values: &[f32]) -> Result<()> {
    let pipeline = Pipeline::with_model_files(&config.model_files, config.device_id)?;
    let output = pipeline.run_regression(values)?;

    let plot_path = prepare_output(config, "scatter")?;
    output
        .plot
        .save_with_format(&plot_path, config.output_format())
        .with_context(|| format!("Failed to save plot: {}", plot_path.display()))?;

    info!(
        points = output.data.len(),
        plot = %plot_path.display(),
        "regression complete"
    );
    Ok(())
}

fn run_classification(config: &Config, data: &Path, labels: &Path) -> Result<()> {
    let pipeline = Pipeline::with_model_files(&config.model_files, config.device_id)?;
    let output = pipeline.run_classification(data, labels)?;

    output
        .write_to(&config.output_dir, config.output_format())
        .with_context(|| {
            format!(
                "Failed to write classification outputs: {}",
                config.output_dir.display()
            )
        })?;

    println!("{}", output);
    Ok(())
}

fn run_segmentation(config: &Config, data: &Path, annotation: Option<&Path>) -> Result<()> {
    let pipeline = Pipeline::with_model_files(&config.model_files, config.device_id)?;
    let output = pipeline.run_segmentation(data, annotation)?;

    // The pipeline has fully succeeded; now write the display set as one
    // batch.
    let format = config.output_format();
    let image_path = prepare_output(config, "image")?;
    output
        .image
        .save_with_format(&image_path, format)
        .with_context(|| format!("Failed to save image: {}", image_path.display()))?;

    if let Some(annotation_img) = &output.annotation {
        let annotation_path = prepare_output(config, "annotation")?;
        annotation_img
            .save_with_format(&annotation_path, format)
            .with_context(|| format!("Failed to save annotation: {}", annotation_path.display()))?;
    }

    let mask_path = prepare_output(config, "mask")?;
    output
        .mask
        .save_with_format(&mask_path, format)
        .with_context(|| format!("Failed to save mask: {}", mask_path.display()))?;

    info!(mask = %mask_path.display(), "segmentation complete");
    Ok(())
}

fn prepare_output(config: &Config, stem: &str) -> Result<std::path::PathBuf> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;
    Ok(config
        .output_dir
        .join(stem)
        .with_extension(&config.format))
}
