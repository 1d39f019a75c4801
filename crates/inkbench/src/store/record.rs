use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review state of a sample. Records start out pending; approval moves the
/// image into the approved area, rejection leaves it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    Pending,
    Approved,
    Rejected,
}

impl SampleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Pending => "pending",
            SampleStatus::Approved => "approved",
            SampleStatus::Rejected => "rejected",
        }
    }
}

/// One handwriting sample and everything known about it.
///
/// `id`, `file`, `orig_name`, `file_size`, `file_hash` and `upload_time`
/// are set at ingestion and never change. The text fields are independent:
/// `provided_text` comes from the uploader, `predicted_text` from the
/// recognizer, `corrected_text` only ever from an approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    pub id: String,
    /// Stored filename, always `<id>.<ext>`. Never the client filename.
    pub file: String,
    /// Client-supplied filename, advisory only.
    pub orig_name: String,
    #[serde(default)]
    pub provided_text: String,
    #[serde(default)]
    pub predicted_text: String,
    #[serde(default)]
    pub corrected_text: String,
    pub status: SampleStatus,
    #[serde(default)]
    pub notes: String,
    pub upload_time: DateTime<Utc>,
    pub file_size: u64,
    /// SHA-256 digest of the image bytes, the dedup key.
    pub file_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_time: Option<DateTime<Utc>>,
}

impl SampleRecord {
    /// Creates a fresh pending record at ingestion time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        file: impl Into<String>,
        orig_name: impl Into<String>,
        provided_text: impl Into<String>,
        predicted_text: impl Into<String>,
        file_size: u64,
        file_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            file: file.into(),
            orig_name: orig_name.into(),
            provided_text: provided_text.into(),
            predicted_text: predicted_text.into(),
            corrected_text: String::new(),
            status: SampleStatus::Pending,
            notes: String::new(),
            upload_time: Utc::now(),
            file_size,
            file_hash: file_hash.into(),
            approval_time: None,
            rejection_time: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == SampleStatus::Approved
    }

    /// Best text for training: corrected over provided over predicted.
    pub fn best_text(&self) -> &str {
        for text in [
            &self.corrected_text,
            &self.provided_text,
            &self.predicted_text,
        ] {
            if !text.trim().is_empty() {
                return text;
            }
        }
        ""
    }
}
