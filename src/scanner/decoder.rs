//! Barcode decoding over candidate regions and rotations.

use std::collections::HashMap;

use image::{imageops, GrayImage};

use crate::scanner::regions::find_barcode_regions;

/// Counter-clockwise rotations tried on every candidate, in order.
pub const ROTATIONS: [u16; 4] = [0, 90, 180, 270];

/// Decodes a single barcode or QR code from a grayscale image.
pub trait BarcodeReader: Send + Sync {
    fn decode(&self, image: &GrayImage) -> Option<String>;
}

/// Multi-format reader (EAN/UPC, Code 128/39, QR, Data Matrix, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct RxingReader;

impl BarcodeReader for RxingReader {
    fn decode(&self, image: &GrayImage) -> Option<String> {
        let (width, height) = image.dimensions();
        let mut hints = HashMap::new();
        match rxing::helpers::detect_in_luma_with_hints(
            image.as_raw().clone(),
            width,
            height,
            None,
            &mut hints,
        ) {
            Ok(result) => {
                let text = result.getText();
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(e) => {
                tracing::trace!(error = ?e, width, height, "No barcode in image");
                None
            }
        }
    }
}

/// Rotates counter-clockwise by a multiple of 90 degrees.
pub fn rotate(image: &GrayImage, degrees: u16) -> GrayImage {
    match degrees % 360 {
        90 => imageops::rotate270(image),
        180 => imageops::rotate180(image),
        270 => imageops::rotate90(image),
        _ => image.clone(),
    }
}

/// Region-based decoding.
///
/// Each candidate region is cropped and tried at every rotation; the first
/// decoded value wins. When no region yields a value the whole image is
/// tried at every rotation as well.
pub fn robust_decode(reader: &dyn BarcodeReader, gray: &GrayImage) -> Option<String> {
    let regions = find_barcode_regions(gray);
    tracing::debug!(count = regions.len(), "Candidate barcode regions");

    for region in &regions {
        if let Some(text) = decode_rotated(reader, &region.crop(gray)) {
            tracing::debug!(?region, "Barcode decoded in region");
            return Some(text);
        }
    }

    let text = decode_rotated(reader, gray);
    if text.is_some() {
        tracing::debug!("Barcode decoded in whole image");
    }
    text
}

fn decode_rotated(reader: &dyn BarcodeReader, image: &GrayImage) -> Option<String> {
    ROTATIONS.into_iter().find_map(|degrees| {
        let text = reader.decode(&rotate(image, degrees))?;
        tracing::trace!(degrees, "Decoded after rotation");
        Some(text)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use image::Luma;

    use super::*;

    /// Records every image size it is asked to decode.
    #[derive(Default)]
    struct RecordingReader {
        seen: Mutex<Vec<(u32, u32)>>,
        answer_on_call: Option<usize>,
    }

    impl BarcodeReader for RecordingReader {
        fn decode(&self, image: &GrayImage) -> Option<String> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(image.dimensions());
            (Some(seen.len()) == self.answer_on_call).then(|| "HIT".to_string())
        }
    }

    fn with_bars() -> GrayImage {
        let mut image = GrayImage::from_pixel(320, 200, Luma([255]));
        for i in 0..30 {
            for y in 60..120 {
                for x in 0..2 {
                    image.put_pixel(80 + i * 5 + x, y, Luma([0]));
                }
            }
        }
        image
    }

    // ============ EAN-13 rendering for end-to-end decoding ============

    const L_CODES: [&str; 10] = [
        "0001101", "0011001", "0010011", "0111101", "0100011", "0110001", "0101111", "0111011",
        "0110111", "0001011",
    ];
    const G_CODES: [&str; 10] = [
        "0100111", "0110011", "0011011", "0100001", "0011101", "0111001", "0000101", "0010001",
        "0001001", "0010111",
    ];
    const R_CODES: [&str; 10] = [
        "1110010", "1100110", "1101100", "1000010", "1011100", "1001110", "1010000", "1000100",
        "1001000", "1110100",
    ];
    const PARITY: [&str; 10] = [
        "LLLLLL", "LLGLGG", "LLGGLG", "LLGGGL", "LGLLGG", "LGGLLG", "LGGGLL", "LGLGLG", "LGLGGL",
        "LGGLGL",
    ];

    fn ean13_modules(code: &str) -> String {
        let digits: Vec<usize> = code.bytes().map(|b| usize::from(b - b'0')).collect();
        assert_eq!(digits.len(), 13);

        let mut modules = String::from("101");
        for (i, parity) in PARITY[digits[0]].chars().enumerate() {
            let digit = digits[i + 1];
            modules.push_str(if parity == 'L' { L_CODES[digit] } else { G_CODES[digit] });
        }
        modules.push_str("01010");
        for &digit in &digits[7..] {
            modules.push_str(R_CODES[digit]);
        }
        modules.push_str("101");
        modules
    }

    fn render_ean13(code: &str, module_px: u32, bar_height: u32, margin: u32) -> GrayImage {
        let modules = ean13_modules(code);
        let width = modules.len() as u32 * module_px + 2 * margin;
        let height = bar_height + 2 * margin;
        let mut image = GrayImage::from_pixel(width, height, Luma([255]));
        for (i, module) in modules.chars().enumerate() {
            if module != '1' {
                continue;
            }
            for dx in 0..module_px {
                for y in margin..margin + bar_height {
                    image.put_pixel(margin + i as u32 * module_px + dx, y, Luma([0]));
                }
            }
        }
        image
    }

    #[test]
    fn test_ean13_modules_length() {
        assert_eq!(ean13_modules("4006381333931").len(), 95);
    }

    #[test]
    fn test_rotate_dimensions() {
        let image = GrayImage::new(40, 10);
        assert_eq!(rotate(&image, 0).dimensions(), (40, 10));
        assert_eq!(rotate(&image, 90).dimensions(), (10, 40));
        assert_eq!(rotate(&image, 180).dimensions(), (40, 10));
        assert_eq!(rotate(&image, 270).dimensions(), (10, 40));
    }

    #[test]
    fn test_rotate_90_is_counter_clockwise() {
        let mut image = GrayImage::from_pixel(3, 2, Luma([0]));
        image.put_pixel(2, 0, Luma([255])); // top-right
        let rotated = rotate(&image, 90);
        // Counter-clockwise: top-right moves to top-left.
        assert_eq!(rotated.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_whole_image_tried_when_no_regions() {
        let reader = RecordingReader::default();
        let blank = GrayImage::from_pixel(100, 80, Luma([255]));
        assert_eq!(robust_decode(&reader, &blank), None);
        assert_eq!(
            *reader.seen.lock().unwrap(),
            vec![(100, 80), (80, 100), (100, 80), (80, 100)]
        );
    }

    #[test]
    fn test_all_rotations_tried_per_region_then_whole_image() {
        let reader = RecordingReader::default();
        assert_eq!(robust_decode(&reader, &with_bars()), None);

        let seen = reader.seen.lock().unwrap();
        assert_eq!(seen.len(), 2 * ROTATIONS.len());
        // Region crop first.
        assert_eq!(seen[0].0, seen[2].0);
        assert_eq!(seen[1], (seen[0].1, seen[0].0));
        assert!(seen[0].0 < 320);
        // Then the whole image.
        assert_eq!(&seen[4..], &[(320, 200), (200, 320), (320, 200), (200, 320)]);
    }

    #[test]
    fn test_stops_at_first_hit() {
        let reader = RecordingReader {
            answer_on_call: Some(2),
            ..RecordingReader::default()
        };
        assert_eq!(robust_decode(&reader, &with_bars()), Some("HIT".to_string()));
        assert_eq!(reader.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_rxing_decodes_rendered_ean13() {
        let image = render_ean13("4006381333931", 2, 60, 30);
        assert_eq!(
            robust_decode(&RxingReader, &image),
            Some("4006381333931".to_string())
        );
    }

    #[test]
    fn test_rxing_decodes_barcode_rotated_90() {
        let image = imageops::rotate90(&render_ean13("4006381333931", 2, 60, 30));
        assert_eq!(
            robust_decode(&RxingReader, &image),
            Some("4006381333931".to_string())
        );
    }

    #[test]
    fn test_rxing_decodes_barcode_inside_photo_sized_canvas() {
        let label = render_ean13("4006381333931", 2, 60, 10);
        let mut canvas = GrayImage::from_pixel(1200, 900, Luma([255]));
        imageops::replace(&mut canvas, &label, 400, 500);
        // Unrelated dark text-like block above the label.
        for y in 100..140 {
            for x in 200..260 {
                canvas.put_pixel(x, y, Luma([0]));
            }
        }
        assert_eq!(
            robust_decode(&RxingReader, &canvas),
            Some("4006381333931".to_string())
        );
    }

    #[test]
    fn test_rxing_finds_nothing_in_blank_image() {
        let blank = GrayImage::from_pixel(120, 80, Luma([255]));
        assert_eq!(RxingReader.decode(&blank), None);
    }
}
