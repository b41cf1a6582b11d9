//! Durable file writes shared by the dataset and model stores

use crate::error::{PredictorError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` through a temp sibling and a rename.
///
/// Readers see either the old file or the complete new one. On failure the
/// temp file is removed and the target is left untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| PredictorError::storage(parent, format!("failed to create directory: {}", e)))?;
    }

    let temp_path = temp_path_for(path);
    let result = write_and_sync(&temp_path, bytes).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|e| {
            PredictorError::storage(path, format!("failed to rename {:?} into place: {}", temp_path, e))
        })
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_and_sync(temp_path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(temp_path)
        .map_err(|e| PredictorError::storage(temp_path, format!("failed to create file: {}", e)))?;
    file.write_all(bytes)
        .map_err(|e| PredictorError::storage(temp_path, format!("failed to write: {}", e)))?;
    file.sync_all()
        .map_err(|e| PredictorError::storage(temp_path, format!("failed to sync: {}", e)))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
