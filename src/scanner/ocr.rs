//! OCR fallback through the Tesseract command line.

use std::io::Cursor;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use image::{GrayImage, ImageFormat};
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Extracts raw text from a PNG-encoded image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, png: &[u8]) -> AppResult<String>;
}

/// Runs `tesseract stdin stdout -l <lang>` with the image piped in as PNG.
#[derive(Debug, Clone)]
pub struct Tesseract {
    command: String,
    lang: String,
    timeout: Duration,
}

impl Tesseract {
    pub fn new(command: impl Into<String>, lang: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            lang: lang.into(),
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.tesseract_cmd,
            &config.ocr_lang,
            Duration::from_secs(config.ocr_timeout_secs),
        )
    }

    async fn run(&self, png: &[u8]) -> AppResult<String> {
        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", self.lang.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Ocr(format!("failed to start {}: {e}", self.command)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Ocr("tesseract stdin unavailable".to_string()))?;
        stdin.write_all(png).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TextRecognizer for Tesseract {
    async fn recognize(&self, png: &[u8]) -> AppResult<String> {
        tokio::time::timeout(self.timeout, self.run(png))
            .await
            .map_err(|_| {
                AppError::Ocr(format!("tesseract timed out after {:?}", self.timeout))
            })?
    }
}

/// Encodes a grayscale image as PNG.
pub fn encode_png(image: &GrayImage) -> AppResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// First match of `pattern` in the upper-cased OCR text.
///
/// When the pattern has a capture group, the first group is returned.
pub fn extract_code(text: &str, pattern: &Regex) -> Option<String> {
    let upper = text.to_uppercase();
    let captures = pattern.captures(&upper)?;
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    fn azt() -> Regex {
        Regex::new(r"AZT\d+").unwrap()
    }

    #[test]
    fn test_extract_code_finds_asset_tag() {
        let text = "Inventory\nazt10013025 property of\n";
        assert_eq!(extract_code(text, &azt()), Some("AZT10013025".to_string()));
    }

    #[test]
    fn test_extract_code_first_match_wins() {
        assert_eq!(
            extract_code("AZT1 AZT2", &azt()),
            Some("AZT1".to_string())
        );
    }

    #[test]
    fn test_extract_code_none() {
        assert_eq!(extract_code("AZT only letters", &azt()), None);
        assert_eq!(extract_code("", &azt()), None);
    }

    #[test]
    fn test_extract_code_uses_capture_group() {
        let pattern = Regex::new(r"TAG[:\s]*(\d{4,})").unwrap();
        assert_eq!(
            extract_code("tag: 004512", &pattern),
            Some("004512".to_string())
        );
    }

    #[test]
    fn test_encode_png_signature() {
        let image = GrayImage::from_pixel(4, 4, Luma([128]));
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn test_missing_binary_is_ocr_error() {
        let tesseract = Tesseract::new(
            "definitely-not-a-real-tesseract-binary",
            "eng",
            Duration::from_secs(5),
        );
        let png = encode_png(&GrayImage::from_pixel(4, 4, Luma([255]))).unwrap();
        let err = tesseract.recognize(&png).await.unwrap_err();
        assert!(matches!(err, AppError::Ocr(_)));
    }
}
