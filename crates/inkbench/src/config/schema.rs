use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_data_directory")]
    pub data_directory: String,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
}

fn default_data_directory() -> String {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("inkbench")
        .join("data")
        .to_string_lossy()
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Image extensions accepted at upload, without the leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "bmp", "tiff", "webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Recognized lines at or below this confidence are dropped.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_confidence_threshold() -> f32 {
    0.5
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: default_languages(),
            confidence_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Minimum number of approved samples before training is worthwhile.
    #[serde(default = "default_min_approved")]
    pub min_approved: usize,
    /// Required fraction of approved samples carrying corrected text.
    #[serde(default = "default_correction_ratio")]
    pub correction_ratio: f64,
    /// Required fraction of distinct normalized corrected texts.
    #[serde(default = "default_diversity_ratio")]
    pub diversity_ratio: f64,
}

fn default_min_approved() -> usize {
    100
}

fn default_correction_ratio() -> f64 {
    0.8
}

fn default_diversity_ratio() -> f64 {
    0.7
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            min_approved: default_min_approved(),
            correction_ratio: default_correction_ratio(),
            diversity_ratio: default_diversity_ratio(),
        }
    }
}
