//! Ingestion: validate an uploaded image, de-duplicate by content hash,
//! place the bytes in the pending area and create the sample record.

use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, info_span, warn};

use crate::config::LimitsConfig;
use crate::error::IngestError;
use crate::recognizer::{concat_confident, TextRecognizer};
use crate::sanitize;
use crate::storage::SampleVault;
use crate::store::{LabelStore, SampleRecord};

/// Stored extension when neither content type nor filename yields one.
const DEFAULT_EXTENSION: &str = "jpg";

/// Declared image content types and the extension they are stored under.
const MIME_TO_EXTENSION: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tiff"),
    ("image/webp", "webp"),
];

/// Result of an ingestion call. `duplicate` means the bytes matched an
/// existing record and nothing new was created.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub upload_id: String,
    pub predicted_text: String,
    pub duplicate: bool,
}

pub struct IngestService {
    store: Arc<LabelStore>,
    vault: Arc<SampleVault>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
    limits: LimitsConfig,
    confidence_threshold: f32,
}

impl IngestService {
    pub fn new(
        store: Arc<LabelStore>,
        vault: Arc<SampleVault>,
        recognizer: Option<Arc<dyn TextRecognizer>>,
        limits: LimitsConfig,
        confidence_threshold: f32,
    ) -> Self {
        Self {
            store,
            vault,
            recognizer,
            limits,
            confidence_threshold,
        }
    }

    /// Ingests one uploaded image.
    ///
    /// Validation order: empty content, size limit, extension allow-list.
    /// Byte-identical re-uploads resolve to the existing record. Recognizer
    /// failure is not an error: the prediction is simply empty.
    pub fn ingest(
        &self,
        image: &[u8],
        original_filename: &str,
        content_type: Option<&str>,
        provided_text: Option<&str>,
    ) -> Result<IngestOutcome, IngestError> {
        let _span = info_span!(
            "ingest",
            filename = %sanitize::redact_path(Path::new(original_filename)),
            size = image.len(),
        )
        .entered();

        if image.is_empty() {
            return Err(IngestError::EmptyUpload);
        }

        if image.len() as u64 > self.limits.max_file_size {
            return Err(IngestError::FileTooLarge {
                size: image.len() as u64,
                max: self.limits.max_file_size,
            });
        }

        let client_extension = filename_extension(original_filename).unwrap_or_default();
        if !self.is_allowed(&client_extension) {
            return Err(IngestError::UnsupportedType {
                extension: client_extension,
            });
        }

        let file_hash = hex::encode(Sha256::digest(image));

        if let Some(existing) = self.store.find_by_hash(&file_hash) {
            warn!(
                hash = sanitize::short_hash(&file_hash),
                existing = %existing.id,
                "Duplicate upload resolved to existing sample"
            );
            return Ok(IngestOutcome {
                upload_id: existing.id,
                predicted_text: existing.predicted_text,
                duplicate: true,
            });
        }

        let extension = self.resolve_extension(content_type, original_filename);
        let upload_id = uuid::Uuid::new_v4().to_string();
        let stored_name = format!("{}.{}", upload_id, extension);

        self.vault.store_pending(&stored_name, image)?;

        let predicted_text = self.run_recognizer(image);

        let record = SampleRecord::new(
            upload_id.clone(),
            stored_name.clone(),
            original_filename,
            provided_text.unwrap_or(""),
            predicted_text.clone(),
            image.len() as u64,
            file_hash,
        );

        if let Err(e) = self.store.add(record) {
            // No orphan files: the record never made it, so the image goes too
            if let Err(cleanup) = self.vault.remove_pending(&stored_name) {
                tracing::error!(error = %cleanup, "Failed to clean up file after store failure");
            }
            return Err(e.into());
        }

        info!(id = %upload_id, "Created sample record");

        Ok(IngestOutcome {
            upload_id,
            predicted_text,
            duplicate: false,
        })
    }

    fn run_recognizer(&self, image: &[u8]) -> String {
        let recognizer = match &self.recognizer {
            Some(recognizer) => recognizer,
            None => return String::new(),
        };

        match recognizer.recognize(image) {
            Ok(lines) => concat_confident(&lines, self.confidence_threshold),
            Err(e) => {
                warn!(error = %e, "Recognition failed, storing sample without prediction");
                String::new()
            }
        }
    }

    fn is_allowed(&self, extension: &str) -> bool {
        self.limits
            .allowed_extensions
            .iter()
            .any(|allowed| allowed == extension)
    }

    /// Resolves the stored extension: declared content type first, then the
    /// client filename, then the default. The client filename itself is
    /// never stored.
    fn resolve_extension(&self, content_type: Option<&str>, original_filename: &str) -> String {
        if let Some(content_type) = content_type {
            let content_type = content_type.to_ascii_lowercase();
            if content_type.starts_with("image/") {
                for (mime, extension) in MIME_TO_EXTENSION {
                    if *mime == content_type && self.is_allowed(extension) {
                        return extension.to_string();
                    }
                }
                // Unrecognized image subtype: accept a mime_guess candidate
                // that is on the allow-list
                if let Some(candidates) = mime_guess::get_mime_extensions_str(&content_type) {
                    if let Some(extension) = candidates.iter().find(|c| self.is_allowed(c)) {
                        return extension.to_string();
                    }
                }
            }
        }

        match filename_extension(original_filename) {
            Some(extension) if self.is_allowed(&extension) => extension,
            _ => DEFAULT_EXTENSION.to_string(),
        }
    }
}

fn filename_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::recognizer::RecognizedLine;
    use tempfile::TempDir;

    struct StubRecognizer {
        lines: Vec<RecognizedLine>,
    }

    impl TextRecognizer for StubRecognizer {
        fn recognize(&self, _image: &[u8]) -> Result<Vec<RecognizedLine>, OcrError> {
            Ok(self.lines.clone())
        }
    }

    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&self, _image: &[u8]) -> Result<Vec<RecognizedLine>, OcrError> {
            Err(OcrError::RecognitionFailed("engine unavailable".to_string()))
        }
    }

    struct Fixture {
        _dir: TempDir,
        store: Arc<LabelStore>,
        vault: Arc<SampleVault>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store = Arc::new(LabelStore::open(dir.path().join("labels.json")));
            let vault = Arc::new(
                SampleVault::new(dir.path().join("images"), dir.path().join("approved"))
                    .unwrap(),
            );
            Self {
                _dir: dir,
                store,
                vault,
            }
        }

        fn service(&self, recognizer: Option<Arc<dyn TextRecognizer>>) -> IngestService {
            IngestService::new(
                Arc::clone(&self.store),
                Arc::clone(&self.vault),
                recognizer,
                LimitsConfig::default(),
                0.5,
            )
        }
    }

    #[test]
    fn test_empty_upload_rejected() {
        let fixture = Fixture::new();
        let service = fixture.service(None);

        let result = service.ingest(b"", "a.png", None, None);
        assert!(matches!(result, Err(IngestError::EmptyUpload)));
        assert!(fixture.store.is_empty());
    }

    #[test]
    fn test_oversized_upload_rejected() {
        let fixture = Fixture::new();
        let service = IngestService::new(
            Arc::clone(&fixture.store),
            Arc::clone(&fixture.vault),
            None,
            LimitsConfig {
                max_file_size: 4,
                ..Default::default()
            },
            0.5,
        );

        let result = service.ingest(b"12345", "a.png", None, None);
        assert!(matches!(
            result,
            Err(IngestError::FileTooLarge { size: 5, max: 4 })
        ));
    }

    #[test]
    fn test_disallowed_extension_rejected() {
        let fixture = Fixture::new();
        let service = fixture.service(None);

        let result = service.ingest(b"data", "notes.txt", None, None);
        assert!(matches!(
            result,
            Err(IngestError::UnsupportedType { extension }) if extension == "txt"
        ));
    }

    #[test]
    fn test_missing_extension_rejected() {
        let fixture = Fixture::new();
        let service = fixture.service(None);

        let result = service.ingest(b"data", "noextension", None, None);
        assert!(matches!(result, Err(IngestError::UnsupportedType { .. })));
    }

    #[test]
    fn test_ingest_creates_pending_record_and_file() {
        let fixture = Fixture::new();
        let service = fixture.service(None);

        let outcome = service
            .ingest(b"image bytes", "scan.png", Some("image/png"), Some("hello"))
            .unwrap();
        assert!(!outcome.duplicate);

        let record = fixture.store.get(&outcome.upload_id).unwrap();
        assert_eq!(record.file, format!("{}.png", outcome.upload_id));
        assert_eq!(record.orig_name, "scan.png");
        assert_eq!(record.provided_text, "hello");
        assert_eq!(record.file_size, 11);
        assert!(fixture.vault.pending_path(&record.file).exists());
    }

    #[test]
    fn test_reupload_is_idempotent() {
        let fixture = Fixture::new();
        let service = fixture.service(None);

        let first = service.ingest(b"same bytes", "a.png", None, None).unwrap();
        let second = service.ingest(b"same bytes", "b.jpg", None, None).unwrap();

        assert!(second.duplicate);
        assert_eq!(second.upload_id, first.upload_id);
        assert_eq!(fixture.store.len(), 1);

        // No second file either
        let files: Vec<_> = std::fs::read_dir(fixture.vault.pending_dir())
            .unwrap()
            .collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_distinct_content_gets_distinct_ids() {
        let fixture = Fixture::new();
        let service = fixture.service(None);

        let a = service.ingest(b"content a", "a.png", None, None).unwrap();
        let b = service.ingest(b"content b", "b.png", None, None).unwrap();

        assert_ne!(a.upload_id, b.upload_id);
        assert_eq!(fixture.store.len(), 2);
    }

    #[test]
    fn test_prediction_from_recognizer() {
        let fixture = Fixture::new();
        let recognizer = StubRecognizer {
            lines: vec![
                RecognizedLine {
                    text: "hello".to_string(),
                    confidence: 0.9,
                },
                RecognizedLine {
                    text: "noise".to_string(),
                    confidence: 0.2,
                },
                RecognizedLine {
                    text: "world".to_string(),
                    confidence: 0.8,
                },
            ],
        };
        let service = fixture.service(Some(Arc::new(recognizer)));

        let outcome = service.ingest(b"image", "a.png", None, None).unwrap();
        assert_eq!(outcome.predicted_text, "hello world");
        assert_eq!(
            fixture.store.get(&outcome.upload_id).unwrap().predicted_text,
            "hello world"
        );
    }

    #[test]
    fn test_recognizer_failure_is_non_fatal() {
        let fixture = Fixture::new();
        let service = fixture.service(Some(Arc::new(FailingRecognizer)));

        let outcome = service.ingest(b"image", "a.png", None, None).unwrap();
        assert!(!outcome.duplicate);
        assert_eq!(outcome.predicted_text, "");
        assert!(fixture.store.get(&outcome.upload_id).is_some());
    }

    #[test]
    fn test_duplicate_returns_existing_prediction() {
        let fixture = Fixture::new();
        let recognizer = StubRecognizer {
            lines: vec![RecognizedLine {
                text: "predicted".to_string(),
                confidence: 0.9,
            }],
        };
        let service = fixture.service(Some(Arc::new(recognizer)));

        service.ingest(b"bytes", "a.png", None, None).unwrap();

        // Second service without a recognizer still reports the stored prediction
        let service = fixture.service(None);
        let outcome = service.ingest(b"bytes", "a.png", None, None).unwrap();
        assert!(outcome.duplicate);
        assert_eq!(outcome.predicted_text, "predicted");
    }

    #[test]
    fn test_extension_from_content_type_wins_over_filename() {
        let fixture = Fixture::new();
        let service = fixture.service(None);

        let outcome = service
            .ingest(b"bytes", "photo.png", Some("image/jpeg"), None)
            .unwrap();
        let record = fixture.store.get(&outcome.upload_id).unwrap();
        assert!(record.file.ends_with(".jpg"));
    }

    #[test]
    fn test_extension_falls_back_to_filename() {
        let fixture = Fixture::new();
        let service = fixture.service(None);

        let outcome = service
            .ingest(b"bytes", "photo.webp", Some("application/octet-stream"), None)
            .unwrap();
        let record = fixture.store.get(&outcome.upload_id).unwrap();
        assert!(record.file.ends_with(".webp"));
    }

    #[test]
    fn test_stored_name_is_never_the_client_name() {
        let fixture = Fixture::new();
        let service = fixture.service(None);

        let outcome = service
            .ingest(b"bytes", "../../../etc/passwd.png", None, None)
            .unwrap();
        let record = fixture.store.get(&outcome.upload_id).unwrap();
        assert_eq!(record.file, format!("{}.png", outcome.upload_id));
        assert!(fixture.vault.pending_path(&record.file).exists());
    }
}
