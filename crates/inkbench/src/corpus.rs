//! Wires the components into a working corpus: directory layout, store,
//! vault, ingestion, review, analysis and export behind one handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analyzer::{self, DatasetAnalysis, ReadinessReport};
use crate::config::Config;
use crate::error::{CorpusError, ExportError, IngestError, ReviewError};
use crate::export::{ExportSummary, TrainingExporter};
use crate::ingest::{IngestOutcome, IngestService};
use crate::recognizer::{TesseractRecognizer, TextRecognizer};
use crate::review::ReviewWorkflow;
use crate::storage::SampleVault;
use crate::store::LabelStore;

/// On-disk layout under the data directory:
/// `labels.json`, `images/` (pending area), `approved/`, `train_data/`,
/// `reports/`.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn labels_file(&self) -> PathBuf {
        self.root.join("labels.json")
    }

    pub fn pending_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn approved_dir(&self) -> PathBuf {
        self.root.join("approved")
    }

    pub fn train_data_dir(&self) -> PathBuf {
        self.root.join("train_data")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }
}

pub struct CorpusManager {
    config: Config,
    layout: DataLayout,
    store: Arc<LabelStore>,
    ingest: IngestService,
    review: ReviewWorkflow,
    exporter: TrainingExporter,
}

impl CorpusManager {
    /// Production constructor: builds the Tesseract recognizer when OCR is
    /// enabled in the config.
    pub fn from_config(config: Config) -> Result<Self, CorpusError> {
        let recognizer: Option<Arc<dyn TextRecognizer>> = if config.ocr.enabled {
            Some(Arc::new(TesseractRecognizer::new(&config.ocr.languages)))
        } else {
            None
        };
        Self::with_recognizer(config, recognizer)
    }

    /// Constructor with an injected recognizer so tests can substitute a
    /// stub.
    pub fn with_recognizer(
        config: Config,
        recognizer: Option<Arc<dyn TextRecognizer>>,
    ) -> Result<Self, CorpusError> {
        let layout = DataLayout::new(&config.data_directory);

        let store = Arc::new(LabelStore::open(layout.labels_file()));
        let vault = Arc::new(SampleVault::new(
            layout.pending_dir(),
            layout.approved_dir(),
        )?);

        let ingest = IngestService::new(
            Arc::clone(&store),
            Arc::clone(&vault),
            recognizer,
            config.limits.clone(),
            config.ocr.confidence_threshold,
        );
        let review = ReviewWorkflow::new(Arc::clone(&store), Arc::clone(&vault));
        let exporter = TrainingExporter::new(
            Arc::clone(&store),
            layout.approved_dir(),
            layout.train_data_dir(),
            config.limits.allowed_extensions.clone(),
        );

        Ok(Self {
            config,
            layout,
            store,
            ingest,
            review,
            exporter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn store(&self) -> &Arc<LabelStore> {
        &self.store
    }

    pub fn ingest(
        &self,
        image: &[u8],
        original_filename: &str,
        content_type: Option<&str>,
        provided_text: Option<&str>,
    ) -> Result<IngestOutcome, IngestError> {
        self.ingest
            .ingest(image, original_filename, content_type, provided_text)
    }

    pub fn approve(&self, id: &str, corrected_text: &str) -> Result<(), ReviewError> {
        self.review.approve(id, corrected_text)
    }

    pub fn reject(&self, id: &str, reason: Option<&str>) -> Result<(), ReviewError> {
        self.review.reject(id, reason)
    }

    pub fn delete(&self, id: &str) -> Result<(), ReviewError> {
        self.review.delete(id)
    }

    pub fn analyze(&self) -> DatasetAnalysis {
        analyzer::analyze(&self.store.list())
    }

    pub fn readiness(&self) -> ReadinessReport {
        analyzer::assess(
            &self.store.list(),
            &self.config.readiness,
            self.exporter.train_list_exists(),
        )
    }

    /// Emits a timestamped monitoring report and returns its path.
    pub fn write_report(&self) -> Result<PathBuf, ExportError> {
        let analysis = self.analyze();
        let readiness = self.readiness();
        analyzer::write_report(&self.layout.reports_dir(), &analysis, &readiness)
    }

    pub fn prepare_training(&self) -> Result<ExportSummary, ExportError> {
        self.exporter.prepare()
    }
}
