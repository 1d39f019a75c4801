//! Review transitions: approve, reject, delete.
//!
//! File operations are the point of no return. Approve moves the image
//! first and updates metadata second; when the metadata write fails the
//! move is compensated (best effort) and the original error surfaced.
//! Authorization is checked upstream; this component assumes the caller
//! already passed it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, info_span};

use crate::error::ReviewError;
use crate::storage::SampleVault;
use crate::store::{LabelStore, SampleStatus};

const DEFAULT_REJECT_NOTE: &str = "rejected by admin";
const APPROVE_NOTE: &str = "approved by admin";

pub struct ReviewWorkflow {
    store: Arc<LabelStore>,
    vault: Arc<SampleVault>,
}

impl ReviewWorkflow {
    pub fn new(store: Arc<LabelStore>, vault: Arc<SampleVault>) -> Self {
        Self { store, vault }
    }

    /// Approves a sample: the corrected transcription becomes the training
    /// text and the image moves to the approved area.
    pub fn approve(&self, id: &str, corrected_text: &str) -> Result<(), ReviewError> {
        let _span = info_span!("review.approve", id = %id).entered();

        let corrected_text = corrected_text.trim();
        if corrected_text.is_empty() {
            return Err(ReviewError::MissingCorrectedText);
        }

        let record = self
            .store
            .get(id)
            .ok_or_else(|| ReviewError::NotFound { id: id.to_string() })?;

        let pending_path = self.vault.pending_path(&record.file);
        if !pending_path.exists() {
            return Err(ReviewError::SourceFileMissing { path: pending_path });
        }

        self.vault.promote(&record.file)?;

        let updated = self.store.update(id, |r| {
            r.status = SampleStatus::Approved;
            r.corrected_text = corrected_text.to_string();
            r.notes = APPROVE_NOTE.to_string();
            r.approval_time = Some(Utc::now());
        });

        match updated {
            Ok(true) => {
                info!("Sample approved");
                Ok(())
            }
            Ok(false) => {
                // Record vanished between get and update; put the file back
                self.compensate_move(&record.file);
                Err(ReviewError::NotFound { id: id.to_string() })
            }
            Err(e) => {
                self.compensate_move(&record.file);
                Err(e.into())
            }
        }
    }

    /// Rejects a sample. The image stays in the pending area so the sample
    /// remains re-reviewable.
    pub fn reject(&self, id: &str, reason: Option<&str>) -> Result<(), ReviewError> {
        let _span = info_span!("review.reject", id = %id).entered();

        let note = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REJECT_NOTE);

        let updated = self.store.update(id, |r| {
            r.status = SampleStatus::Rejected;
            r.notes = note.to_string();
            r.rejection_time = Some(Utc::now());
        })?;

        if !updated {
            return Err(ReviewError::NotFound { id: id.to_string() });
        }

        info!("Sample rejected");
        Ok(())
    }

    /// Deletes a sample permanently: the image is removed from whichever
    /// areas hold it, then the record goes. File removal failures are
    /// logged and do not block record removal.
    pub fn delete(&self, id: &str) -> Result<(), ReviewError> {
        let _span = info_span!("review.delete", id = %id).entered();

        let record = self
            .store
            .get(id)
            .ok_or_else(|| ReviewError::NotFound { id: id.to_string() })?;

        let removed = self.vault.remove_everywhere(&record.file);

        if !self.store.delete(id)? {
            return Err(ReviewError::NotFound { id: id.to_string() });
        }

        info!(files_removed = removed, "Sample deleted");
        Ok(())
    }

    fn compensate_move(&self, filename: &str) {
        if let Err(e) = self.vault.demote(filename) {
            error!(
                file = %filename,
                error = %e,
                "Failed to move file back after metadata failure"
            );
        }
    }
}
