use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Get price data directory from environment variable or use default
pub fn get_price_data_dir() -> PathBuf {
    std::env::var("PRICE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("price_data"))
}

/// Write file atomically (write to temp, then rename).
///
/// A reader of `path` sees either the previous content or the new content,
/// never a partial write. The temp file lives next to the target so the
/// rename stays on one filesystem.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, data)
        .map_err(|e| Error::Io(format!("Failed to write {}: {}", temp_path.display(), e)))?;

    if let Err(e) = fs::rename(&temp_path, path) {
        // Clean up temp file
        let _ = fs::remove_file(&temp_path);
        return Err(Error::Io(format!(
            "Failed to rename {} -> {}: {}",
            temp_path.display(),
            path.display(),
            e
        )));
    }

    Ok(())
}
