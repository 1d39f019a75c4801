use std::path::{Path, PathBuf};

use crate::error::VaultError;

/// Move a file from `src` to `dst`. Uses `rename` first (fast, atomic on
/// same filesystem). Falls back to copy + delete when rename fails, which
/// handles cross-device moves.
fn move_file(src: &Path, dst: &Path) -> Result<(), VaultError> {
    // Fast path: atomic rename
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    // Slow path: copy then remove original
    std::fs::copy(src, dst).map_err(|e| VaultError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| VaultError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// The two image areas a sample file can live in. A record's file is in the
/// pending area while pending or rejected and in the approved area once
/// approved, never in both.
pub struct SampleVault {
    pending_dir: PathBuf,
    approved_dir: PathBuf,
}

impl SampleVault {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        pending_dir: P,
        approved_dir: Q,
    ) -> Result<Self, VaultError> {
        let vault = Self {
            pending_dir: pending_dir.as_ref().to_path_buf(),
            approved_dir: approved_dir.as_ref().to_path_buf(),
        };
        ensure_directory(&vault.pending_dir)?;
        ensure_directory(&vault.approved_dir)?;
        Ok(vault)
    }

    pub fn pending_dir(&self) -> &Path {
        &self.pending_dir
    }

    pub fn approved_dir(&self) -> &Path {
        &self.approved_dir
    }

    pub fn pending_path(&self, filename: &str) -> PathBuf {
        self.pending_dir.join(filename)
    }

    pub fn approved_path(&self, filename: &str) -> PathBuf {
        self.approved_dir.join(filename)
    }

    /// Writes new sample bytes into the pending area.
    ///
    /// Uses exclusive creation (O_CREAT | O_EXCL): ids are fresh UUIDs, so a
    /// name collision means something else owns the path and is an error.
    pub fn store_pending(&self, filename: &str, content: &[u8]) -> Result<PathBuf, VaultError> {
        use std::io::Write;

        let path = self.pending_path(filename);
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(VaultError::FileExists(path));
            }
            Err(e) => {
                return Err(VaultError::WriteFile { path, source: e });
            }
        };

        file.write_all(content).map_err(|e| VaultError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Moves a sample file from the pending area to the approved area.
    pub fn promote(&self, filename: &str) -> Result<(), VaultError> {
        move_file(&self.pending_path(filename), &self.approved_path(filename))
    }

    /// Moves a sample file back from the approved area to the pending area.
    /// Compensation for a failed approval.
    pub fn demote(&self, filename: &str) -> Result<(), VaultError> {
        move_file(&self.approved_path(filename), &self.pending_path(filename))
    }

    /// Removes a sample file from the pending area.
    pub fn remove_pending(&self, filename: &str) -> Result<(), VaultError> {
        let path = self.pending_path(filename);
        std::fs::remove_file(&path).map_err(|e| VaultError::RemoveFile { path, source: e })
    }

    /// Removes a sample file from whichever areas hold it. Absence is not an
    /// error; removal failures are logged and skipped. Returns the number of
    /// copies removed.
    pub fn remove_everywhere(&self, filename: &str) -> usize {
        let mut removed = 0;
        for path in [self.pending_path(filename), self.approved_path(filename)] {
            if !path.exists() {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Removed sample file");
                    removed += 1;
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to remove sample file");
                }
            }
        }
        removed
    }
}

fn ensure_directory(path: &Path) -> Result<(), VaultError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| VaultError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}
