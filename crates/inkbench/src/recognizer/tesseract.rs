use std::io::Cursor;
use std::sync::Arc;

use crate::error::OcrError;
use crate::recognizer::{RecognizedLine, TextRecognizer};

/// Tesseract-backed recognizer.
///
/// Tesseract reports one mean confidence per recognition pass, so every
/// returned line carries that same value.
#[derive(Clone)]
pub struct TesseractRecognizer {
    inner: Arc<TesseractRecognizerInner>,
}

struct TesseractRecognizerInner {
    languages: String,
}

impl TesseractRecognizer {
    pub fn new(languages: &[String]) -> Self {
        let lang_str = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(TesseractRecognizerInner {
                languages: lang_str,
            }),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image_data: &[u8]) -> Result<Vec<RecognizedLine>, OcrError> {
        let _span = tracing::info_span!("recognizer.tesseract").entered();

        // Load image
        let img = image::load_from_memory(image_data)
            .map_err(|e| OcrError::InvalidImage(format!("Failed to load image: {}", e)))?;

        // Convert to PNG in memory for leptess
        let mut png_data = Vec::new();
        let mut cursor = Cursor::new(&mut png_data);
        img.write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(format!("Failed to convert image: {}", e)))?;

        // Create Tesseract instance
        let mut lt = leptess::LepTess::new(None, &self.inner.languages).map_err(|e| {
            OcrError::RecognitionFailed(format!("Failed to initialize Tesseract: {}", e))
        })?;

        // Set image from PNG bytes
        lt.set_image_from_mem(&png_data).map_err(|e| {
            OcrError::RecognitionFailed(format!("Failed to set image for OCR: {}", e))
        })?;

        // Get text
        let text = lt
            .get_utf8_text()
            .map_err(|e| OcrError::RecognitionFailed(format!("OCR failed: {}", e)))?;

        let confidence = (lt.mean_text_conf().clamp(0, 100) as f32) / 100.0;

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| RecognizedLine {
                text: line.to_string(),
                confidence,
            })
            .collect())
    }
}
