//! Run cursor - persists where the next run should resume
//!
//! The cursor is rewritten after every batch so a killed process loses at
//! most one batch of work.

use crate::error::Result;
use crate::utils::write_atomic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCursor {
    /// Offset into the catalog at which the next run starts
    #[serde(rename = "lastIndex")]
    pub last_index: usize,
}

impl RunCursor {
    pub fn new(last_index: usize) -> Self {
        Self { last_index }
    }

    /// Load cursor from file, or start from zero if it doesn't exist
    pub fn load(cursor_path: &Path) -> Self {
        match fs::read_to_string(cursor_path) {
            Ok(content) => match serde_json::from_str::<RunCursor>(&content) {
                Ok(cursor) => {
                    debug!(
                        path = %cursor_path.display(),
                        last_index = cursor.last_index,
                        "Loaded run cursor"
                    );
                    cursor
                }
                Err(e) => {
                    warn!(
                        "Failed to parse run cursor from {}: {}. Starting from 0.",
                        cursor_path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No existing run cursor at {}, starting from 0", cursor_path.display());
                Self::default()
            }
        }
    }

    /// Save cursor to file
    pub fn save(&self, cursor_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(cursor_path, content.as_bytes())?;
        debug!(last_index = self.last_index, "Saved run cursor");
        Ok(())
    }

    /// Start offset for a catalog of `catalog_len` items.
    ///
    /// The catalog may have shrunk since the cursor was written, so the stored
    /// index is wrapped instead of trusted.
    pub fn start_for(&self, catalog_len: usize) -> usize {
        if catalog_len == 0 {
            0
        } else {
            self.last_index % catalog_len
        }
    }
}

/// Get the path to the run cursor file
pub fn get_cursor_path(data_dir: &Path) -> PathBuf {
    data_dir.join(crate::constants::CURSOR_FILE)
}
