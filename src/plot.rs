use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::errors::{InferVizError, Result};

const MARGIN: u32 = 40;
const POINT_RADIUS: i32 = 3;
const AXIS_COLOR: Rgb<u8> = Rgb([60, 60, 60]);
const POINT_COLOR: Rgb<u8> = Rgb([30, 90, 200]);
const BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Paired samples for a 2-D scatter plot of inputs against predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterData {
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
}

impl ScatterData {
    pub fn new(xs: Vec<f32>, ys: Vec<f32>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(InferVizError::validation(
                "scatter data",
                format!("x/y length mismatch: {} vs {}", xs.len(), ys.len()),
            ));
        }
        if xs.is_empty() {
            return Err(InferVizError::validation("scatter data", "is empty"));
        }
        Ok(Self { xs, ys })
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

/// Render a scatter plot to a raster image: a left and bottom axis plus one
/// filled circle per sample, with the data range stretched into the plot
/// area. Degenerate ranges (a single point, or all values equal) collapse to
/// the center of the axis instead of dividing by zero.
pub fn render_scatter(data: &ScatterData, width: u32, height: u32) -> Result<RgbImage> {
    if width <= 2 * MARGIN || height <= 2 * MARGIN {
        return Err(InferVizError::validation(
            "plot size",
            format!("{}x{} leaves no room inside the margins", width, height),
        ));
    }

    let mut img = RgbImage::from_pixel(width, height, BACKGROUND_COLOR);

    let left = MARGIN as f32;
    let right = (width - MARGIN) as f32;
    let top = MARGIN as f32;
    let bottom = (height - MARGIN) as f32;

    draw_line_segment_mut(&mut img, (left, top), (left, bottom), AXIS_COLOR);
    draw_line_segment_mut(&mut img, (left, bottom), (right, bottom), AXIS_COLOR);

    let (x_min, x_max) = min_max(&data.xs);
    let (y_min, y_max) = min_max(&data.ys);

    for (&x, &y) in data.xs.iter().zip(&data.ys) {
        let px = project(x, x_min, x_max, left, right);
        // Raster y grows downward; flip so larger values plot higher.
        let py = project(y, y_min, y_max, bottom, top);
        draw_filled_circle_mut(&mut img, (px as i32, py as i32), POINT_RADIUS, POINT_COLOR);
    }

    Ok(img)
}

fn min_max(values: &[f32]) -> (f32, f32) {
    values.iter().fold(
        (f32::INFINITY, f32::NEG_INFINITY),
        |(min, max), &v| (min.min(v), max.max(v)),
    )
}

fn project(value: f32, v_min: f32, v_max: f32, out_start: f32, out_end: f32) -> f32 {
    if v_max <= v_min {
        return (out_start + out_end) / 2.0;
    }
    out_start + (value - v_min) / (v_max - v_min) * (out_end - out_start)
}
