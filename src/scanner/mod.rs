//! Barcode scanning module.
//!
//! Decodes a photo into an asset code: region-based barcode detection first,
//! OCR of the whole image as fallback.

pub mod decoder;
pub mod ocr;
pub mod regions;

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

pub use decoder::{robust_decode, BarcodeReader, RxingReader};
pub use ocr::{encode_png, extract_code, Tesseract, TextRecognizer};
pub use regions::{find_barcode_regions, Region};

/// Outcome of the blocking barcode pass.
enum BarcodePass {
    Found(String),
    /// Nothing decoded; the grayscale image re-encoded for OCR.
    Missed { png: Vec<u8> },
}

/// Turns raw image bytes into an asset code.
#[async_trait]
pub trait CodeScanner: Send + Sync {
    /// `Ok(None)` when nothing readable was found.
    async fn scan(&self, image: Vec<u8>) -> AppResult<Option<String>>;
}

/// Barcode reader with OCR fallback.
pub struct Scanner {
    reader: Arc<dyn BarcodeReader>,
    recognizer: Arc<dyn TextRecognizer>,
    code_pattern: Regex,
}

impl Scanner {
    pub fn new(
        reader: Arc<dyn BarcodeReader>,
        recognizer: Arc<dyn TextRecognizer>,
        code_pattern: Regex,
    ) -> Self {
        Self {
            reader,
            recognizer,
            code_pattern,
        }
    }

    /// `rxing` reader plus Tesseract, as configured.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let code_pattern = Regex::new(&config.ocr_code_pattern)
            .map_err(|e| AppError::Config(format!("Invalid OCR_CODE_PATTERN: {e}")))?;

        Ok(Self::new(
            Arc::new(RxingReader),
            Arc::new(Tesseract::from_config(config)),
            code_pattern,
        ))
    }

    /// Decodes the image and runs the barcode pass off the async runtime.
    ///
    /// On a miss the grayscale image is PNG-encoded in the same blocking
    /// task so the OCR pass only does I/O.
    async fn decode_barcode(&self, image: Vec<u8>) -> AppResult<BarcodePass> {
        let reader = Arc::clone(&self.reader);

        tokio::task::spawn_blocking(move || -> AppResult<_> {
            let gray = image::load_from_memory(&image)?.to_luma8();
            match robust_decode(reader.as_ref(), &gray) {
                Some(code) => Ok(BarcodePass::Found(code)),
                None => Ok(BarcodePass::Missed {
                    png: encode_png(&gray)?,
                }),
            }
        })
        .await
        .map_err(|e| AppError::Internal(format!("barcode task failed: {e}")))?
    }

    /// OCR pass; failures are logged and read as "nothing found".
    async fn ocr_fallback(&self, png: &[u8]) -> Option<String> {
        match self.recognizer.recognize(png).await {
            Ok(text) => {
                let code = extract_code(&text, &self.code_pattern);
                tracing::debug!(
                    chars = text.len(),
                    found = code.is_some(),
                    "OCR fallback finished"
                );
                code
            }
            Err(e) => {
                tracing::warn!(error = %e, "OCR fallback failed");
                None
            }
        }
    }
}

#[async_trait]
impl CodeScanner for Scanner {
    async fn scan(&self, image: Vec<u8>) -> AppResult<Option<String>> {
        match self.decode_barcode(image).await? {
            BarcodePass::Found(code) => Ok(Some(code)),
            BarcodePass::Missed { png } => Ok(self.ocr_fallback(&png).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use image::{GrayImage, Luma};

    use super::*;

    struct FixedReader(Option<&'static str>);

    impl BarcodeReader for FixedReader {
        fn decode(&self, _image: &GrayImage) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    /// `None` simulates an OCR engine failure.
    struct FixedText {
        text: Option<&'static str>,
        calls: AtomicUsize,
        received: Mutex<Vec<Vec<u8>>>,
    }

    impl FixedText {
        fn ok(text: &'static str) -> Self {
            Self {
                text: Some(text),
                calls: AtomicUsize::new(0),
                received: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextRecognizer for FixedText {
        async fn recognize(&self, png: &[u8]) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.received.lock().unwrap().push(png.to_vec());
            self.text
                .map(str::to_string)
                .ok_or_else(|| AppError::Ocr("engine crashed".to_string()))
        }
    }

    fn png() -> Vec<u8> {
        encode_png(&GrayImage::from_pixel(64, 48, Luma([255]))).unwrap()
    }

    fn scanner(reader: Option<&'static str>, ocr: Arc<FixedText>) -> Scanner {
        Scanner::new(
            Arc::new(FixedReader(reader)),
            ocr,
            Regex::new(r"AZT\d+").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_barcode_hit_skips_ocr() {
        let ocr = Arc::new(FixedText::ok("AZT999"));
        let scanner = scanner(Some("4006381333931"), ocr.clone());

        let code = scanner.scan(png()).await.unwrap();
        assert_eq!(code.as_deref(), Some("4006381333931"));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ocr_fallback_extracts_asset_tag() {
        let ocr = Arc::new(FixedText::ok("Property: azt10013025\n"));
        let scanner = scanner(None, ocr.clone());

        let code = scanner.scan(png()).await.unwrap();
        assert_eq!(code.as_deref(), Some("AZT10013025"));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_ocr_receives_grayscale_png_from_barcode_pass() {
        // RGB JPEG in; OCR must see a grayscale PNG of the same size.
        let rgb = image::RgbImage::from_pixel(64, 48, image::Rgb([200, 30, 30]));
        let mut jpeg = std::io::Cursor::new(Vec::new());
        rgb.write_to(&mut jpeg, image::ImageFormat::Jpeg).unwrap();

        let ocr = Arc::new(FixedText::ok("AZT7"));
        let scanner = scanner(None, ocr.clone());
        let code = scanner.scan(jpeg.into_inner()).await.unwrap();
        assert_eq!(code.as_deref(), Some("AZT7"));

        let received = ocr.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(&received[0][..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&received[0]).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[tokio::test]
    async fn test_ocr_without_tag_finds_nothing() {
        let scanner = scanner(None, Arc::new(FixedText::ok("no tag here")));
        assert_eq!(scanner.scan(png()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ocr_failure_finds_nothing() {
        let ocr = Arc::new(FixedText {
            text: None,
            ..FixedText::ok("")
        });
        let scanner = scanner(None, ocr);
        assert_eq!(scanner.scan(png()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_undecodable_bytes_are_image_error() {
        let scanner = scanner(None, Arc::new(FixedText::ok("")));
        let err = scanner.scan(b"not an image".to_vec()).await.unwrap_err();
        assert!(matches!(err, AppError::Image(_)));
    }
}
