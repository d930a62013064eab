use image::GrayImage;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Square 0/1 structuring element with an odd side length; the anchor is the
/// center tap.
pub struct Kernel {
    size: usize,
    taps: &'static [u8],
}

impl Kernel {
    pub const fn size(&self) -> usize {
        self.size
    }

    fn tap(&self, ky: usize, kx: usize) -> bool {
        self.taps[ky * self.size + kx] == 1
    }

    const fn radius(&self) -> i64 {
        (self.size / 2) as i64
    }
}

/// 9x9 near-circular disk used by the denoising erosion pass.
#[rustfmt::skip]
pub const EROSION_KERNEL: Kernel = Kernel {
    size: 9,
    taps: &[
        0, 0, 0, 0, 1, 0, 0, 0, 0,
        0, 0, 1, 1, 1, 1, 1, 0, 0,
        0, 1, 1, 1, 1, 1, 1, 1, 0,
        0, 1, 1, 1, 1, 1, 1, 1, 0,
        1, 1, 1, 1, 1, 1, 1, 1, 1,
        0, 1, 1, 1, 1, 1, 1, 1, 0,
        0, 1, 1, 1, 1, 1, 1, 1, 0,
        0, 0, 1, 1, 1, 1, 1, 0, 0,
        0, 0, 0, 0, 1, 0, 0, 0, 0,
    ],
};

/// 5x5 near-circular disk used by the bulk-restoring dilation pass.
#[rustfmt::skip]
pub const DILATION_KERNEL: Kernel = Kernel {
    size: 5,
    taps: &[
        0, 0, 1, 0, 0,
        0, 1, 1, 1, 0,
        1, 1, 1, 1, 1,
        0, 1, 1, 1, 0,
        0, 0, 1, 0, 0,
    ],
};

/// Morphological erosion of a binary mask, one iteration.
///
/// A pixel stays foreground only if every in-bounds neighbor covered by a
/// kernel tap is foreground. Taps falling outside the image are ignored
/// (kernel clipped at the border), so an all-255 mask erodes to itself
/// including the border rows.
pub fn erode(mask: &GrayImage, kernel: &Kernel) -> GrayImage {
    morph(mask, kernel, true)
}

/// Morphological dilation of a binary mask, one iteration.
///
/// A pixel becomes foreground if any in-bounds neighbor covered by a kernel
/// tap is foreground. Border handling matches [`erode`].
pub fn dilate(mask: &GrayImage, kernel: &Kernel) -> GrayImage {
    morph(mask, kernel, false)
}

/// The open operation of the mask post-processor: erode with the 9x9 disk,
/// then dilate with the 5x5 disk. Removes specks smaller than the erosion
/// footprint and restores the bulk of what survives.
pub fn open(mask: &GrayImage) -> GrayImage {
    dilate(&erode(mask, &EROSION_KERNEL), &DILATION_KERNEL)
}

fn morph(mask: &GrayImage, kernel: &Kernel, erosion: bool) -> GrayImage {
    let (width, height) = mask.dimensions();
    let radius = kernel.radius();
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            // Erosion starts from foreground and looks for a missing
            // neighbor; dilation starts from background and looks for a
            // present one.
            let mut value = if erosion { FOREGROUND } else { BACKGROUND };

            'taps: for ky in 0..kernel.size() {
                for kx in 0..kernel.size() {
                    if !kernel.tap(ky, kx) {
                        continue;
                    }
                    let ny = i64::from(y) + ky as i64 - radius;
                    let nx = i64::from(x) + kx as i64 - radius;
                    if ny < 0 || nx < 0 || ny >= i64::from(height) || nx >= i64::from(width) {
                        continue;
                    }
                    let neighbor = mask.get_pixel(nx as u32, ny as u32)[0];
                    if erosion && neighbor != FOREGROUND {
                        value = BACKGROUND;
                        break 'taps;
                    }
                    if !erosion && neighbor == FOREGROUND {
                        value = FOREGROUND;
                        break 'taps;
                    }
                }
            }

            out.put_pixel(x, y, image::Luma([value]));
        }
    }

    out
}
