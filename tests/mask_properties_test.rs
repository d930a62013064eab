use image::GrayImage;
use ndarray::Array3;

use infer_viz_rs::labeling::label_components;
use infer_viz_rs::morphology::{dilate, erode, open, DILATION_KERNEL, EROSION_KERNEL};
use infer_viz_rs::postprocess::postprocess;

fn uniform(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, image::Luma([value]))
}

#[test]
fn open_on_all_zero_stays_all_zero() {
    let opened = open(&uniform(64, 48, 0));
    assert!(opened.pixels().all(|p| p[0] == 0));
}

#[test]
fn open_on_all_foreground_stays_all_foreground() {
    // Larger than both reference kernels (9x9 then 5x5); with clipped-border
    // handling the border survives too.
    let opened = open(&uniform(64, 48, 255));
    assert!(opened.pixels().all(|p| p[0] == 255));
}

#[test]
fn erode_then_dilate_never_exceeds_dilate_alone() {
    let mut mask = uniform(40, 40, 0);
    for y in 10..30 {
        for x in 10..30 {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }
    let opened = dilate(&erode(&mask, &EROSION_KERNEL), &DILATION_KERNEL);
    let dilated = dilate(&mask, &DILATION_KERNEL);
    for (o, d) in opened.pixels().zip(dilated.pixels()) {
        assert!(o[0] <= d[0]);
    }
}

#[test]
fn labeling_after_open_partitions_foreground() {
    let mut mask = uniform(64, 64, 0);
    // Two blobs comfortably above the erosion footprint.
    for y in 4..24 {
        for x in 4..24 {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }
    for y in 36..60 {
        for x in 36..60 {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }

    let opened = open(&mask);
    let (labels, max_label) = label_components(&opened);
    assert_eq!(max_label, 2);
    for (x, y, p) in opened.enumerate_pixels() {
        let label = labels[[y as usize, x as usize]];
        assert_eq!(label > 0, p[0] == 255);
    }
}

#[test]
fn postprocess_below_threshold_scores_yields_black() {
    // Raw scores whose sigmoid stays at or below 0.5 everywhere.
    let raw = Array3::<f32>::zeros((24, 24, 1));
    let rendered = postprocess(raw.view().into_dyn(), (24, 24)).unwrap();
    assert!(rendered.pixels().all(|p| p[0] == 0));
}

#[test]
fn postprocess_is_deterministic() {
    let mut raw = Array3::<f32>::from_elem((32, 32, 1), -3.0);
    for y in 8..26 {
        for x in 6..28 {
            raw[[y, x, 0]] = 3.0;
        }
    }
    let first = postprocess(raw.view().into_dyn(), (48, 48)).unwrap();
    let second = postprocess(raw.view().into_dyn(), (48, 48)).unwrap();
    assert_eq!(first.as_raw(), second.as_raw());
}
