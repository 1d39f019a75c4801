//! Label store: the single JSON document mapping sample id to record.
//!
//! Every mutation rewrites the whole document through a temp file followed
//! by an atomic rename, so the on-disk file is never observed half-written.
//! A corrupted document is quarantined under a timestamped name and the
//! store continues empty instead of failing startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::error::StoreError;
use crate::store::record::SampleRecord;

pub struct LabelStore {
    path: PathBuf,
    records: RwLock<HashMap<String, SampleRecord>>,
}

impl LabelStore {
    /// Opens the store at `path`, loading the existing document if any.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create label store directory: {}", e);
            }
        }

        let records = load_or_quarantine(&path);
        Self {
            path,
            records: RwLock::new(records),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds a new record and persists the document.
    ///
    /// On persistence failure the in-memory insert is rolled back, so memory
    /// and disk never diverge.
    pub fn add(&self, record: SampleRecord) -> Result<(), StoreError> {
        let id = record.id.clone();
        let mut records = self.write_lock();
        let previous = records.insert(id.clone(), record);

        if let Err(e) = persist(&self.path, &records) {
            match previous {
                Some(prev) => records.insert(id, prev),
                None => records.remove(&id),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Applies `apply` to the record with `id` and persists the document.
    /// Returns `false` when the id is unknown; rolls the mutation back when
    /// persistence fails.
    pub fn update<F>(&self, id: &str, apply: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut SampleRecord),
    {
        let mut records = self.write_lock();
        let previous = match records.get_mut(id) {
            Some(record) => {
                let previous = record.clone();
                apply(record);
                previous
            }
            None => return Ok(false),
        };

        if let Err(e) = persist(&self.path, &records) {
            records.insert(id.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    /// Removes the record with `id`. Returns `false` when the id is unknown.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.write_lock();
        let previous = match records.remove(id) {
            Some(previous) => previous,
            None => return Ok(false),
        };

        if let Err(e) = persist(&self.path, &records) {
            records.insert(id.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    pub fn get(&self, id: &str) -> Option<SampleRecord> {
        self.read_lock().get(id).cloned()
    }

    /// Returns all records, newest upload first.
    pub fn list(&self) -> Vec<SampleRecord> {
        let records = self.read_lock();
        let mut result: Vec<SampleRecord> = records.values().cloned().collect();
        result.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));
        result
    }

    /// Returns the first record whose content hash matches, if any.
    pub fn find_by_hash(&self, file_hash: &str) -> Option<SampleRecord> {
        self.read_lock()
            .values()
            .find(|r| r.file_hash == file_hash)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, HashMap<String, SampleRecord>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Label store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, HashMap<String, SampleRecord>> {
        match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Label store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn load_or_quarantine(path: &Path) -> HashMap<String, SampleRecord> {
    if !path.exists() {
        log::info!("Label document does not exist, starting with empty store");
        return HashMap::new();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::error!("Failed to read label document: {}", e);
            return HashMap::new();
        }
    };

    match serde_json::from_str::<HashMap<String, SampleRecord>>(&content) {
        Ok(records) => {
            log::info!("Loaded {} existing labels", records.len());
            records
        }
        Err(e) => {
            log::error!("Corrupted label document: {}", e);
            let stamp = Utc::now().format("%Y%m%d_%H%M%S");
            let backup = path.with_extension(format!("backup.{}.json", stamp));
            match std::fs::rename(path, &backup) {
                Ok(()) => log::info!("Corrupted document backed up to: {}", backup.display()),
                Err(e) => log::error!("Failed to quarantine corrupted document: {}", e),
            }
            HashMap::new()
        }
    }
}

fn persist(path: &Path, records: &HashMap<String, SampleRecord>) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(records)?;

    let temp = path.with_extension("tmp");
    if let Err(e) = std::fs::write(&temp, json) {
        let _ = std::fs::remove_file(&temp);
        return Err(StoreError::WriteFile {
            path: temp,
            source: e,
        });
    }

    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(StoreError::ReplaceFile {
            path: path.to_path_buf(),
            source: e,
        });
    }

    Ok(())
}
