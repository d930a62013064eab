use image::GrayImage;
use ndarray::Array2;

use crate::morphology::FOREGROUND;

/// Flood-fill labeling of a binary mask into 4-connected components.
///
/// The mask is scanned row-major; each unlabeled foreground pixel (value 255)
/// starts a new component and receives the next unused positive label, which
/// is then propagated through up/down/left/right neighbors with an explicit
/// work-list (no recursion, so component size never threatens the stack).
/// Background pixels keep label 0. For a fixed mask the assignment is
/// deterministic: labels follow first-encounter order and are never reused.
///
/// Returns the `[H, W]` label map and the highest label assigned (0 for an
/// all-background mask). Each foreground pixel is pushed at most once, so the
/// whole pass is O(width * height) in time and space.
pub fn label_components(mask: &GrayImage) -> (Array2<u32>, u32) {
    let (width, height) = mask.dimensions();
    let mut labels = Array2::<u32>::zeros((height as usize, width as usize));
    let mut current = 0u32;
    let mut worklist: Vec<(u32, u32)> = Vec::new();

    let foreground = |x: u32, y: u32| mask.get_pixel(x, y)[0] == FOREGROUND;

    for y in 0..height {
        for x in 0..width {
            if !foreground(x, y) || labels[[y as usize, x as usize]] != 0 {
                continue;
            }

            current += 1;
            // Label on push, not on pop, so no pixel enters the list twice.
            labels[[y as usize, x as usize]] = current;
            worklist.push((x, y));

            while let Some((cx, cy)) = worklist.pop() {
                let mut visit = |nx: u32, ny: u32| {
                    if foreground(nx, ny) && labels[[ny as usize, nx as usize]] == 0 {
                        labels[[ny as usize, nx as usize]] = current;
                        worklist.push((nx, ny));
                    }
                };
                if cx > 0 {
                    visit(cx - 1, cy);
                }
                if cx + 1 < width {
                    visit(cx + 1, cy);
                }
                if cy > 0 {
                    visit(cx, cy - 1);
                }
                if cy + 1 < height {
                    visit(cx, cy + 1);
                }
            }
        }
    }

    (labels, current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::BACKGROUND;
    use std::collections::HashMap;

    fn mask_from_rows(rows: &[&[u8]]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        GrayImage::from_fn(width, height, |x, y| {
            image::Luma([if rows[y as usize][x as usize] == 1 {
                FOREGROUND
            } else {
                BACKGROUND
            }])
        })
    }

    #[test]
    fn background_stays_zero_and_foreground_gets_positive_labels() {
        let mask = mask_from_rows(&[
            &[1, 1, 0, 0],
            &[0, 1, 0, 1],
            &[0, 0, 0, 1],
            &[1, 0, 0, 1],
        ]);
        let (labels, max_label) = label_components(&mask);
        assert_eq!(max_label, 3);

        for ((y, x), &label) in labels.indexed_iter() {
            let fg = mask.get_pixel(x as u32, y as u32)[0] == FOREGROUND;
            assert_eq!(label > 0, fg, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn diagonal_neighbors_are_separate_components() {
        let mask = mask_from_rows(&[&[1, 0], &[0, 1]]);
        let (labels, max_label) = label_components(&mask);
        assert_eq!(max_label, 2);
        assert_ne!(labels[[0, 0]], labels[[1, 1]]);
    }

    #[test]
    fn labels_follow_row_major_discovery_order() {
        let mask = mask_from_rows(&[
            &[0, 0, 1],
            &[1, 0, 0],
            &[0, 0, 1],
        ]);
        let (labels, _) = label_components(&mask);
        assert_eq!(labels[[0, 2]], 1);
        assert_eq!(labels[[1, 0]], 2);
        assert_eq!(labels[[2, 2]], 3);
    }

    #[test]
    fn connected_region_shares_one_label() {
        // A ring: connected through 4-neighbors all the way around.
        let mask = mask_from_rows(&[
            &[1, 1, 1, 1],
            &[1, 0, 0, 1],
            &[1, 0, 0, 1],
            &[1, 1, 1, 1],
        ]);
        let (labels, max_label) = label_components(&mask);
        assert_eq!(max_label, 1);
        let distinct: std::collections::HashSet<u32> =
            labels.iter().copied().filter(|&l| l > 0).collect();
        assert_eq!(distinct.len(), 1);
    }

    #[test]
    fn labeling_is_deterministic() {
        let mask = mask_from_rows(&[
            &[1, 0, 1, 0, 1],
            &[1, 0, 0, 0, 1],
            &[0, 1, 1, 0, 0],
        ]);
        let (first, first_max) = label_components(&mask);
        let (second, second_max) = label_components(&mask);
        assert_eq!(first, second);
        assert_eq!(first_max, second_max);
    }

    #[test]
    fn relabeling_preserves_the_partition() {
        let mask = mask_from_rows(&[
            &[1, 1, 0, 1],
            &[0, 1, 0, 1],
            &[0, 0, 0, 0],
            &[1, 0, 1, 1],
        ]);
        let (labels, _) = label_components(&mask);

        // Threshold the label map back to binary and label again; absolute
        // numbers may shift, but the grouping of pixels must not.
        let (width, height) = mask.dimensions();
        let rethresholded = GrayImage::from_fn(width, height, |x, y| {
            image::Luma([if labels[[y as usize, x as usize]] > 0 {
                FOREGROUND
            } else {
                BACKGROUND
            }])
        });
        let (relabeled, _) = label_components(&rethresholded);

        let mut mapping: HashMap<u32, u32> = HashMap::new();
        for (&a, &b) in labels.iter().zip(relabeled.iter()) {
            assert_eq!(a > 0, b > 0);
            if a > 0 {
                assert_eq!(*mapping.entry(a).or_insert(b), b);
            }
        }
    }

    #[test]
    fn all_background_mask_has_no_labels() {
        let mask = GrayImage::new(8, 8);
        let (labels, max_label) = label_components(&mask);
        assert_eq!(max_label, 0);
        assert!(labels.iter().all(|&l| l == 0));
    }
}
