//! Shared test doubles and input builders.

#![allow(dead_code)]

use std::sync::Arc;

use inkbench::error::OcrError;
use inkbench::recognizer::{RecognizedLine, TextRecognizer};

/// Recognizer returning a fixed set of lines for every image.
pub struct StubRecognizer {
    lines: Vec<RecognizedLine>,
}

impl StubRecognizer {
    pub fn with_lines(lines: &[(&str, f32)]) -> Arc<dyn TextRecognizer> {
        Arc::new(Self {
            lines: lines
                .iter()
                .map(|(text, confidence)| RecognizedLine {
                    text: text.to_string(),
                    confidence: *confidence,
                })
                .collect(),
        })
    }
}

impl TextRecognizer for StubRecognizer {
    fn recognize(&self, _image: &[u8]) -> Result<Vec<RecognizedLine>, OcrError> {
        Ok(self.lines.clone())
    }
}

/// Recognizer that always fails, for the non-fatal OCR path.
pub struct FailingRecognizer;

impl FailingRecognizer {
    pub fn shared() -> Arc<dyn TextRecognizer> {
        Arc::new(Self)
    }
}

impl TextRecognizer for FailingRecognizer {
    fn recognize(&self, _image: &[u8]) -> Result<Vec<RecognizedLine>, OcrError> {
        Err(OcrError::RecognitionFailed(
            "stub engine unavailable".to_string(),
        ))
    }
}

/// Distinct image bytes per tag; ingestion never decodes them.
pub fn sample_bytes(tag: &str) -> Vec<u8> {
    format!("image-bytes:{}", tag).into_bytes()
}
