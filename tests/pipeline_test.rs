use image::{Rgb, RgbImage};
use ndarray::Array3;
use tempfile::TempDir;

use infer_viz_rs::mocks::{MockClassifierModel, MockLinearModel, MockSegmentationModel};
use infer_viz_rs::{Pipeline, Result};

fn write_test_image(dir: &TempDir, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_pixel(width, height, Rgb([120, 180, 60]))
        .save(&path)
        .unwrap();
    path
}

#[test]
fn regression_plots_inputs_against_predictions() -> Result<()> {
    // X = [1, 2, 3] through a linear model that returns [4, 5, 6].
    let pipeline = Pipeline::new(MockLinearModel::new(3.0));
    let output = pipeline.run_regression(&[1.0, 2.0, 3.0])?;

    assert_eq!(output.data.xs, vec![1.0, 2.0, 3.0]);
    assert_eq!(output.data.ys, vec![4.0, 5.0, 6.0]);
    assert_eq!(output.plot.dimensions(), (640, 480));
    Ok(())
}

#[test]
fn classification_reports_argmax_class_with_confidence() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let image_path = write_test_image(&dir, "input.png", 32, 24);
    let labels_path = dir.path().join("labels.json");
    std::fs::write(&labels_path, r#"["cat", "dog"]"#).unwrap();

    let pipeline = Pipeline::new(MockClassifierModel::new(16, vec![0.2, 0.8]));
    let output = pipeline.run_classification(&image_path, &labels_path)?;

    assert_eq!(output.class_name, "dog");
    assert_eq!(output.to_string(), "dog: 80.00%");
    assert_eq!(output.image.width(), 32);
    Ok(())
}

#[test]
fn classification_writes_image_alongside_prediction_text() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let image_path = write_test_image(&dir, "input.png", 20, 20);
    let labels_path = dir.path().join("labels.json");
    std::fs::write(&labels_path, r#"["cat", "dog"]"#).unwrap();

    let pipeline = Pipeline::new(MockClassifierModel::new(16, vec![0.2, 0.8]));
    let output = pipeline.run_classification(&image_path, &labels_path)?;

    // The display set is the uploaded image next to the text line.
    let out_dir = dir.path().join("out");
    output.write_to(&out_dir, image::ImageFormat::Png)?;

    let saved = image::open(out_dir.join("image.png")).unwrap();
    assert_eq!(saved.width(), 20);
    let text = std::fs::read_to_string(out_dir.join("prediction.txt")).unwrap();
    assert_eq!(text, "dog: 80.00%\n");
    Ok(())
}

#[test]
fn classification_with_out_of_range_index_fails() {
    let dir = TempDir::new().unwrap();
    let image_path = write_test_image(&dir, "input.png", 8, 8);
    let labels_path = dir.path().join("labels.json");
    std::fs::write(&labels_path, r#"["only-one"]"#).unwrap();

    // Three probabilities, one label: arg-max index 2 has no name.
    let pipeline = Pipeline::new(MockClassifierModel::new(8, vec![0.1, 0.2, 0.7]));
    assert!(pipeline.run_classification(&image_path, &labels_path).is_err());
}

#[test]
fn classification_with_unreadable_label_file_fails() {
    let dir = TempDir::new().unwrap();
    let image_path = write_test_image(&dir, "input.png", 8, 8);
    let labels_path = dir.path().join("labels.json");
    std::fs::write(&labels_path, "not json at all").unwrap();

    let pipeline = Pipeline::new(MockClassifierModel::new(8, vec![1.0]));
    assert!(pipeline.run_classification(&image_path, &labels_path).is_err());
}

#[test]
fn segmentation_of_isolated_pixel_renders_black() -> Result<()> {
    // A single foreground score in a 4x4 map is smaller than the 9x9
    // erosion footprint; the opened mask is empty and renders black.
    let mut raw = Array3::<f32>::from_elem((4, 4, 1), -5.0);
    raw[[1, 1, 0]] = 5.0;

    let dir = TempDir::new().unwrap();
    let image_path = write_test_image(&dir, "input.png", 4, 4);

    let pipeline = Pipeline::new(MockSegmentationModel::with_raw(4, raw));
    let output = pipeline.run_segmentation(&image_path, None)?;

    assert_eq!(output.mask.dimensions(), (4, 4));
    assert!(output.mask.pixels().all(|p| p[0] == 0));
    assert!(output.annotation.is_none());
    Ok(())
}

#[test]
fn segmentation_renders_distinct_components_apart() -> Result<()> {
    // Two 12x12 blobs survive the 9x9 erosion; with max label 2 the scale is
    // floor(255 / 2) = 127, so the components render at 127 and 254.
    let mut raw = Array3::<f32>::from_elem((32, 32, 1), -5.0);
    for y in 2..14 {
        for x in 2..14 {
            raw[[y, x, 0]] = 5.0;
        }
    }
    for y in 18..30 {
        for x in 18..30 {
            raw[[y, x, 0]] = 5.0;
        }
    }

    let dir = TempDir::new().unwrap();
    let image_path = write_test_image(&dir, "input.png", 32, 32);

    let pipeline = Pipeline::new(MockSegmentationModel::with_raw(32, raw));
    let output = pipeline.run_segmentation(&image_path, None)?;

    assert_eq!(output.mask.dimensions(), (32, 32));
    // Component interiors keep their exact rendered values; the top-left
    // blob was discovered first.
    assert_eq!(output.mask.get_pixel(7, 7)[0], 127);
    assert_eq!(output.mask.get_pixel(24, 24)[0], 254);
    Ok(())
}

#[test]
fn segmentation_passes_annotation_through() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let image_path = write_test_image(&dir, "input.png", 16, 16);
    let annotation_path = write_test_image(&dir, "annotation.png", 16, 16);

    let pipeline = Pipeline::new(MockSegmentationModel::uniform(16, -5.0));
    let output = pipeline.run_segmentation(&image_path, Some(&annotation_path))?;

    let annotation = output.annotation.expect("annotation should be loaded");
    assert_eq!(annotation.width(), 16);
    // Loaded through the single-channel tensor path, so it displays as
    // greyscale.
    assert_eq!(annotation.color(), image::ColorType::L8);
    Ok(())
}

#[test]
fn segmentation_with_missing_data_file_fails() {
    let pipeline = Pipeline::new(MockSegmentationModel::uniform(16, -5.0));
    let missing = std::path::Path::new("definitely/not/here.png");
    assert!(pipeline.run_segmentation(missing, None).is_err());
}
