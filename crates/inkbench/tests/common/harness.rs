//! Test harness for isolated test execution.
//!
//! `TestHarness` provides a complete isolated environment for exercising
//! the corpus: a temp data directory, a config pointing at it, and manager
//! construction with or without a stub recognizer.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use tempfile::TempDir;

use inkbench::config::Config;
use inkbench::corpus::CorpusManager;
use inkbench::recognizer::TextRecognizer;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Isolated corpus environment rooted in a temp directory.
pub struct TestHarness {
    temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        init_tracing();

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_dir = temp_dir.path().join("data");

        Self { temp_dir, data_dir }
    }

    /// Get the base temp directory path.
    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Config rooted in the harness data directory, OCR disabled.
    pub fn config(&self) -> Config {
        let mut config =
            inkbench::config::load_config_from_str(r#"{"version": "1.0"}"#).expect("valid config");
        config.data_directory = self.data_dir.to_string_lossy().to_string();
        config.ocr.enabled = false;
        config
    }

    /// Manager without a recognizer.
    pub fn manager(&self) -> CorpusManager {
        CorpusManager::with_recognizer(self.config(), None).expect("Failed to build manager")
    }

    /// Manager with an injected recognizer.
    pub fn manager_with_recognizer(&self, recognizer: Arc<dyn TextRecognizer>) -> CorpusManager {
        CorpusManager::with_recognizer(self.config(), Some(recognizer))
            .expect("Failed to build manager")
    }

    /// List all files under a directory (recursively), relative paths.
    pub fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.path().strip_prefix(dir).ok().map(|p| p.to_path_buf()))
            .collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
