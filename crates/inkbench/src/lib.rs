pub mod analyzer;
pub mod auth;
pub mod config;
pub mod corpus;
pub mod error;
pub mod export;
pub mod ingest;
pub mod recognizer;
pub mod review;
pub mod sanitize;
pub mod storage;
pub mod store;

pub use auth::AdminToken;
pub use config::{load_config, Config};
pub use corpus::{CorpusManager, DataLayout};
pub use error::{
    ConfigError, CorpusError, ExportError, IngestError, OcrError, Result, ReviewError,
    StoreError, VaultError,
};
pub use export::{ExportSummary, TrainingExporter};
pub use ingest::{IngestOutcome, IngestService};
pub use recognizer::{RecognizedLine, TesseractRecognizer, TextRecognizer};
pub use review::ReviewWorkflow;
pub use storage::SampleVault;
pub use store::{LabelStore, SampleRecord, SampleStatus};
