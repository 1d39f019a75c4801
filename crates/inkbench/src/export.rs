//! Training data preparation: copies approved images into the training
//! directory with content verification and writes the `train.txt` /
//! `val.txt` hand-off lists, one `<filename>\t<text>` line per sample.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, info_span, warn};

use crate::error::ExportError;
use crate::store::LabelStore;

/// Longest text accepted by the downstream trainer.
const MAX_TEXT_LENGTH: usize = 1000;

#[derive(Debug, Clone)]
pub struct SkippedSample {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Samples that made it into the training list.
    pub prepared: usize,
    /// Total approved samples considered.
    pub approved: usize,
    pub skipped: Vec<SkippedSample>,
}

pub struct TrainingExporter {
    store: Arc<LabelStore>,
    approved_dir: PathBuf,
    output_dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl TrainingExporter {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        store: Arc<LabelStore>,
        approved_dir: P,
        output_dir: Q,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            store,
            approved_dir: approved_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            allowed_extensions,
        }
    }

    pub fn train_list_path(&self) -> PathBuf {
        self.output_dir.join("train.txt")
    }

    pub fn train_list_exists(&self) -> bool {
        self.train_list_path().exists()
    }

    /// Prepares the training set from every approved sample.
    ///
    /// Samples without usable text, with missing or invalid images, or
    /// whose copy fails verification are skipped with a recorded reason;
    /// they never abort the run.
    pub fn prepare(&self) -> Result<ExportSummary, ExportError> {
        let _span = info_span!("export.prepare").entered();

        std::fs::create_dir_all(&self.output_dir).map_err(|e| ExportError::CreateDirectory {
            path: self.output_dir.clone(),
            source: e,
        })?;

        let mut lines: Vec<String> = Vec::new();
        let mut skipped: Vec<SkippedSample> = Vec::new();
        let mut approved = 0usize;

        for record in self.store.list() {
            if !record.is_approved() {
                continue;
            }
            approved += 1;

            let text = sanitize_text(record.best_text());
            if text.is_empty() {
                warn!(id = %record.id, "No usable text, skipping sample");
                skipped.push(SkippedSample {
                    id: record.id.clone(),
                    reason: "No valid text".to_string(),
                });
                continue;
            }

            let src = self.approved_dir.join(&record.file);
            if let Err(reason) = self.validate_image(&src) {
                warn!(id = %record.id, reason = %reason, "Skipping sample");
                skipped.push(SkippedSample {
                    id: record.id.clone(),
                    reason,
                });
                continue;
            }

            let dst = self.output_dir.join(&record.file);
            if let Err(reason) = copy_with_verification(&src, &dst) {
                warn!(id = %record.id, reason = %reason, "Skipping sample");
                skipped.push(SkippedSample {
                    id: record.id.clone(),
                    reason,
                });
                continue;
            }

            lines.push(format!("{}\t{}", record.file, text));
        }

        let content = lines.join("\n");
        for name in ["train.txt", "val.txt"] {
            let path = self.output_dir.join(name);
            std::fs::write(&path, &content).map_err(|e| ExportError::WriteList {
                path: path.clone(),
                source: e,
            })?;
        }

        let summary = ExportSummary {
            prepared: lines.len(),
            approved,
            skipped,
        };

        self.write_report(&summary)?;

        info!(
            prepared = summary.prepared,
            approved = summary.approved,
            skipped = summary.skipped.len(),
            "Training data prepared"
        );

        Ok(summary)
    }

    fn validate_image(&self, path: &Path) -> Result<(), String> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => return Err(format!("Image file not found: {}", path.display())),
        };
        if metadata.len() == 0 {
            return Err(format!("Image file is empty: {}", path.display()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.iter().any(|a| *a == extension) {
            return Err(format!("Invalid image extension: {}", path.display()));
        }

        Ok(())
    }

    fn write_report(&self, summary: &ExportSummary) -> Result<(), ExportError> {
        let path = self.output_dir.join("preparation_report.txt");
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        let success_rate = if summary.approved > 0 {
            summary.prepared as f64 / summary.approved as f64 * 100.0
        } else {
            0.0
        };

        let mut content = String::new();
        let _ = writeln!(content, "Training Data Preparation Report");
        let _ = writeln!(content, "Generated: {}", timestamp);
        let _ = writeln!(content);
        let _ = writeln!(content, "Summary:");
        let _ = writeln!(content, "- Total approved samples: {}", summary.approved);
        let _ = writeln!(content, "- Successfully processed: {}", summary.prepared);
        let _ = writeln!(content, "- Skipped samples: {}", summary.skipped.len());
        let _ = writeln!(content, "- Success rate: {:.1}%", success_rate);
        let _ = writeln!(content);
        let _ = writeln!(content, "Output Directory: {}", self.output_dir.display());
        let _ = writeln!(content, "Files Generated:");
        let _ = writeln!(content, "- train.txt: {} samples", summary.prepared);
        let _ = writeln!(content, "- val.txt: {} samples", summary.prepared);
        let _ = writeln!(content, "- preparation_report.txt: This report");

        if !summary.skipped.is_empty() {
            let _ = writeln!(content);
            let _ = writeln!(content, "Skipped Samples:");
            for skip in &summary.skipped {
                let _ = writeln!(content, "- {}: {}", skip.id, skip.reason);
            }
        }

        std::fs::write(&path, content).map_err(|e| ExportError::WriteReport { path, source: e })
    }
}

/// Cleans text for the tab-separated training list: collapses all
/// whitespace (tabs and newlines included) to single spaces and caps the
/// length.
fn sanitize_text(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() > MAX_TEXT_LENGTH {
        warn!(
            length = normalized.chars().count(),
            "Text truncated to {} characters", MAX_TEXT_LENGTH
        );
        normalized.chars().take(MAX_TEXT_LENGTH).collect()
    } else {
        normalized
    }
}

/// Copies `src` to `dst` and verifies the copy by content digest.
/// A mismatched copy is deleted.
fn copy_with_verification(src: &Path, dst: &Path) -> Result<(), String> {
    let source_bytes =
        std::fs::read(src).map_err(|e| format!("Failed to read {}: {}", src.display(), e))?;
    let source_hash = hex::encode(Sha256::digest(&source_bytes));

    std::fs::copy(src, dst).map_err(|e| format!("File copy failed: {}", e))?;

    let copied_bytes =
        std::fs::read(dst).map_err(|e| format!("Failed to read copy back: {}", e))?;
    let copied_hash = hex::encode(Sha256::digest(&copied_bytes));

    if source_hash != copied_hash {
        let _ = std::fs::remove_file(dst);
        return Err("File copy verification failed".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SampleRecord, SampleStatus};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        store: Arc<LabelStore>,
        approved_dir: PathBuf,
        output_dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store = Arc::new(LabelStore::open(dir.path().join("labels.json")));
            let approved_dir = dir.path().join("approved");
            let output_dir = dir.path().join("train_data");
            std::fs::create_dir_all(&approved_dir).unwrap();
            Self {
                _dir: dir,
                store,
                approved_dir,
                output_dir,
            }
        }

        fn exporter(&self) -> TrainingExporter {
            TrainingExporter::new(
                Arc::clone(&self.store),
                &self.approved_dir,
                &self.output_dir,
                vec!["jpg".into(), "jpeg".into(), "png".into()],
            )
        }

        fn seed_approved(&self, id: &str, corrected: &str, with_file: bool) {
            let file = format!("{}.png", id);
            if with_file {
                std::fs::write(self.approved_dir.join(&file), b"image data").unwrap();
            }
            let mut record = SampleRecord::new(
                id,
                file,
                "orig.png",
                "",
                "",
                10,
                format!("hash-{}", id),
            );
            record.status = SampleStatus::Approved;
            record.corrected_text = corrected.to_string();
            self.store.add(record).unwrap();
        }
    }

    #[test]
    fn test_prepare_writes_both_lists() {
        let fixture = Fixture::new();
        fixture.seed_approved("a", "hello world", true);

        let summary = fixture.exporter().prepare().unwrap();
        assert_eq!(summary.prepared, 1);
        assert_eq!(summary.approved, 1);
        assert!(summary.skipped.is_empty());

        let train = std::fs::read_to_string(fixture.output_dir.join("train.txt")).unwrap();
        let val = std::fs::read_to_string(fixture.output_dir.join("val.txt")).unwrap();
        assert_eq!(train, "a.png\thello world");
        assert_eq!(train, val);
        assert!(fixture.output_dir.join("a.png").exists());
        assert!(fixture.output_dir.join("preparation_report.txt").exists());
    }

    #[test]
    fn test_prepare_skips_missing_text() {
        let fixture = Fixture::new();
        fixture.seed_approved("a", "", true);

        let summary = fixture.exporter().prepare().unwrap();
        assert_eq!(summary.prepared, 0);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].reason.contains("text"));
    }

    #[test]
    fn test_prepare_skips_missing_image() {
        let fixture = Fixture::new();
        fixture.seed_approved("a", "hello", false);

        let summary = fixture.exporter().prepare().unwrap();
        assert_eq!(summary.prepared, 0);
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].reason.contains("not found"));
    }

    #[test]
    fn test_prepare_skips_empty_image() {
        let fixture = Fixture::new();
        let file = fixture.approved_dir.join("a.png");
        std::fs::write(&file, b"").unwrap();
        fixture.seed_approved("a", "hello", false);
        // Record exists, image file is empty
        std::fs::write(&file, b"").unwrap();

        let summary = fixture.exporter().prepare().unwrap();
        assert_eq!(summary.prepared, 0);
        assert!(summary.skipped[0].reason.contains("empty"));
    }

    #[test]
    fn test_prepare_ignores_non_approved() {
        let fixture = Fixture::new();
        let record = SampleRecord::new("p", "p.png", "orig.png", "text", "", 10, "h");
        fixture.store.add(record).unwrap();

        let summary = fixture.exporter().prepare().unwrap();
        assert_eq!(summary.approved, 0);
        assert_eq!(summary.prepared, 0);
    }

    #[test]
    fn test_best_text_fallback_used() {
        let fixture = Fixture::new();
        let file = "f.png".to_string();
        std::fs::write(fixture.approved_dir.join(&file), b"image").unwrap();
        let mut record =
            SampleRecord::new("f", file, "orig.png", "provided words", "", 10, "h");
        record.status = SampleStatus::Approved;
        fixture.store.add(record).unwrap();

        fixture.exporter().prepare().unwrap();
        let train = std::fs::read_to_string(fixture.output_dir.join("train.txt")).unwrap();
        assert_eq!(train, "f.png\tprovided words");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_text("a\tb\nc\r\n  d"), "a b c d");
        assert_eq!(sanitize_text("   "), "");
    }

    #[test]
    fn test_sanitize_truncates_long_text() {
        let long = "x".repeat(1500);
        assert_eq!(sanitize_text(&long).chars().count(), 1000);
    }

    #[test]
    fn test_report_lists_skips() {
        let fixture = Fixture::new();
        fixture.seed_approved("good", "text", true);
        fixture.seed_approved("bad", "", true);

        fixture.exporter().prepare().unwrap();
        let report =
            std::fs::read_to_string(fixture.output_dir.join("preparation_report.txt")).unwrap();
        assert!(report.contains("Total approved samples: 2"));
        assert!(report.contains("Successfully processed: 1"));
        assert!(report.contains("- bad: No valid text"));
    }

    #[test]
    fn test_train_list_exists() {
        let fixture = Fixture::new();
        let exporter = fixture.exporter();
        assert!(!exporter.train_list_exists());

        exporter.prepare().unwrap();
        assert!(exporter.train_list_exists());
    }
}
