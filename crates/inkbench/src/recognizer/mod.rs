pub mod tesseract;

pub use tesseract::TesseractRecognizer;

use crate::error::OcrError;

/// One recognized line of text with the engine's confidence in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedLine {
    pub text: String,
    pub confidence: f32,
}

/// The OCR collaborator. Implementations recognize text in raw image bytes;
/// line ordering is meaningful and must be preserved.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<Vec<RecognizedLine>, OcrError>;
}

/// Joins recognized lines into a prediction string, dropping lines at or
/// below `threshold` and preserving the collaborator's ordering.
pub fn concat_confident(lines: &[RecognizedLine], threshold: f32) -> String {
    lines
        .iter()
        .filter(|line| line.confidence > threshold)
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
