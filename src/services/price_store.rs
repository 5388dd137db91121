//! Persisted price store
//!
//! Layout under the data directory:
//! - `prices_latest.json` - canonical store, keys sorted ascending
//! - `snapshots/prices_<YYYYmmdd_HHMMSS_mmm>.json` - full merged map of one run,
//!   key order unspecified
//!
//! Both targets are written through `write_atomic`, so readers never observe a
//! half-written file.

use crate::constants::{LATEST_PRICES_FILE, SNAPSHOT_DIR};
use crate::error::{Error, Result};
use crate::models::{PriceMap, PriceStore};
use crate::utils::write_atomic;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fold `new_results` into `existing`.
///
/// New entries overwrite existing ones with the same key; nothing is removed.
pub fn merge(mut existing: PriceStore, new_results: &PriceMap) -> PriceStore {
    for (item, summary) in new_results {
        existing.insert(item.clone(), *summary);
    }
    existing
}

/// Statistics of one merge-and-write
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub previous_items: usize,
    pub merged_items: usize,
    pub written_items: usize,
    pub latest_path: PathBuf,
    pub snapshot_path: PathBuf,
}

/// Single writer of the persisted store at the end of a run
pub struct PriceStoreMerger {
    data_dir: PathBuf,
}

impl PriceStoreMerger {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn latest_path(&self) -> PathBuf {
        self.data_dir.join(LATEST_PRICES_FILE)
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_DIR)
    }

    /// Load the canonical store; a missing file is an empty store.
    ///
    /// A file that exists but cannot be parsed is an error, so a bad read
    /// never leads to overwriting collected data with a partial map.
    pub fn load_latest(&self) -> Result<PriceStore> {
        let path = self.latest_path();
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::Parse(format!("Failed to parse price store {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No existing price store at {}, starting empty", path.display());
                Ok(PriceStore::new())
            }
            Err(e) => Err(Error::Io(format!("Failed to read {}: {}", path.display(), e))),
        }
    }

    /// Merge this run's results into the store and write both targets
    pub fn merge_and_write(&self, new_results: &PriceMap, now: DateTime<Utc>) -> Result<MergeOutcome> {
        let existing = self.load_latest()?;
        let previous_items = existing.len();
        let merged = merge(existing, new_results);

        let snapshot_path = self
            .snapshot_dir()
            .join(format!("prices_{}.json", now.format("%Y%m%d_%H%M%S_%3f")));
        let snapshot: HashMap<&String, _> = merged.iter().collect();
        write_atomic(&snapshot_path, serde_json::to_string(&snapshot)?.as_bytes())?;

        let latest_path = self.latest_path();
        write_atomic(&latest_path, serde_json::to_string_pretty(&merged)?.as_bytes())?;

        info!(
            previous_items = previous_items,
            merged_items = merged.len(),
            written_items = new_results.len(),
            latest = %latest_path.display(),
            snapshot = %snapshot_path.display(),
            "Price store updated"
        );

        Ok(MergeOutcome {
            previous_items,
            merged_items: merged.len(),
            written_items: new_results.len(),
            latest_path,
            snapshot_path,
        })
    }

    /// Most recent snapshot file, by name
    pub fn latest_snapshot(&self) -> Option<PathBuf> {
        newest_json_in(&self.snapshot_dir())
    }
}

fn newest_json_in(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .max()
}
