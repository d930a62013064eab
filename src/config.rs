use clap::{Parser, ValueEnum};
use image::ImageFormat;
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    /// 1-D vector in, 1-D vector out, rendered as a scatter plot.
    Regression,
    /// Image in, class-probability vector out, arg-max reported as text.
    Classification,
    /// Image in, dense per-pixel output rendered as a label mask.
    Segmentation,
}

#[derive(Parser, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[arg(short, long, value_enum)]
    pub task: Task,

    /// Model file selection: one `.json` topology manifest plus one or more
    /// binary weight files, in any order.
    #[arg(short, long = "model-file", required = true, num_args = 1..)]
    pub model_files: Vec<PathBuf>,

    /// Input image (classification, segmentation).
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Label file: JSON array of class names (classification) or an optional
    /// annotation image shown next to the prediction (segmentation).
    #[arg(short, long)]
    pub labels: Option<PathBuf>,

    /// Input values for regression, e.g. `--values 1,2,3`.
    #[arg(long, value_delimiter = ',')]
    pub values: Option<Vec<f32>>,

    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(short, long, default_value = "png", value_parser = check_format)]
    pub format: String,

    #[arg(long, default_value_t = 0)]
    pub device_id: i32,
}

impl Config {
    pub fn output_format(&self) -> ImageFormat {
        // The value parser only lets writable extensions through.
        ImageFormat::from_extension(&self.format).unwrap_or(ImageFormat::Png)
    }
}

fn check_format(s: &str) -> Result<String, String> {
    let supported: Vec<_> = ImageFormat::all()
        .filter(|f| f.writing_enabled())
        .flat_map(|f| f.extensions_str())
        .map(|s| format!("`{}`", s))
        .collect();
    let supported_message = format!("Supported formats: {}", supported.join(", "));

    let format = ImageFormat::from_extension(s)
        .ok_or(format!("{} is not supported. {}", s, supported_message))?;
    if !format.writing_enabled() {
        return Err(format!("{} is not supported. {}", s, supported_message));
    }

    Ok(s.to_string())
}
