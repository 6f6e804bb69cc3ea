//! Candidate barcode region detection.
//!
//! Grayscale image → Gaussian blur → Otsu threshold (inverted, bars white) →
//! morphological close with a wide rectangular kernel → bounding boxes of
//! the outermost connected blobs that are large enough to hold a barcode.

use image::{imageops, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{grayscale_close, Mask};
use imageproc::region_labelling::{connected_components, Connectivity};

/// Sigma equivalent to a 3×3 Gaussian kernel.
const BLUR_SIGMA: f32 = 0.8;

/// Close kernel, wide to bridge the gaps between bars.
const CLOSE_KERNEL_WIDTH: u8 = 9;
const CLOSE_KERNEL_HEIGHT: u8 = 3;

/// Regions must be strictly wider / taller than these.
pub const MIN_REGION_WIDTH: u32 = 40;
pub const MIN_REGION_HEIGHT: u32 = 15;

/// Margin added around a region before cropping; decoders need a quiet zone.
pub const CROP_PADDING: u32 = 16;

const FOREGROUND: Luma<u8> = Luma([255]);
const BACKGROUND: Luma<u8> = Luma([0]);

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether `other` lies entirely inside `self`.
    pub const fn contains(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Grows the region by `pad` on every side, clamped to the image.
    pub fn padded(&self, pad: u32, image_width: u32, image_height: u32) -> Self {
        let x = self.x.saturating_sub(pad);
        let y = self.y.saturating_sub(pad);
        let right = self.right().saturating_add(pad).min(image_width);
        let bottom = self.bottom().saturating_add(pad).min(image_height);
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// Copies the region (plus padding) out of `image`.
    pub fn crop(&self, image: &GrayImage) -> GrayImage {
        let area = self.padded(CROP_PADDING, image.width(), image.height());
        imageops::crop_imm(image, area.x, area.y, area.width, area.height).to_image()
    }
}

/// Finds regions that may contain a barcode, ordered top to bottom.
pub fn find_barcode_regions(gray: &GrayImage) -> Vec<Region> {
    if gray.width() == 0 || gray.height() == 0 {
        return Vec::new();
    }

    let blurred = gaussian_blur_f32(gray, BLUR_SIGMA);
    let mask = threshold_inverted(&blurred, otsu_level(&blurred));
    let closed = close_rect(&mask, CLOSE_KERNEL_WIDTH, CLOSE_KERNEL_HEIGHT);

    let boxes: Vec<Region> = component_boxes(&closed)
        .into_iter()
        .filter(|r| r.width > MIN_REGION_WIDTH && r.height > MIN_REGION_HEIGHT)
        .collect();

    outermost(boxes)
}

/// Pixels at or below `level` (dark) become foreground.
pub fn threshold_inverted(image: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] > level {
            BACKGROUND
        } else {
            FOREGROUND
        }
    })
}

/// Morphological close (dilate then erode) with a centered
/// `kernel_width` × `kernel_height` rectangle. Pixels outside the image
/// never contribute.
pub fn close_rect(mask: &GrayImage, kernel_width: u8, kernel_height: u8) -> GrayImage {
    let kernel = GrayImage::from_pixel(
        u32::from(kernel_width.max(1)),
        u32::from(kernel_height.max(1)),
        FOREGROUND,
    );
    let element = Mask::from_image(&kernel, kernel_width / 2, kernel_height / 2);
    grayscale_close(mask, &element)
}

/// Bounding box of every 8-connected foreground blob.
fn component_boxes(mask: &GrayImage) -> Vec<Region> {
    let labels = connected_components(mask, Connectivity::Eight, BACKGROUND);

    // (min_x, min_y, max_x, max_y) per label; label 0 is background.
    let mut extents: Vec<Option<(u32, u32, u32, u32)>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if extents.len() <= label {
            extents.resize(label + 1, None);
        }
        extents[label] = Some(match extents[label] {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let mut boxes: Vec<Region> = extents
        .into_iter()
        .flatten()
        .map(|(x0, y0, x1, y1)| Region {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        })
        .collect();
    boxes.sort_by_key(|r| (r.y, r.x));
    boxes
}

/// Drops boxes nested inside another box (holes and their contents).
fn outermost(boxes: Vec<Region>) -> Vec<Region> {
    boxes
        .iter()
        .enumerate()
        .filter(|(i, inner)| {
            !boxes
                .iter()
                .enumerate()
                .any(|(j, outer)| *i != j && outer != *inner && outer.contains(inner))
        })
        .map(|(_, r)| *r)
        .collect()
}
