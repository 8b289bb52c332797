//! Fetch ledger: which media references have been downloaded, and where to.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{load_json, save_json};

/// One completed download (`fetched.json` value, keyed by media URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchLedgerEntry {
    pub title: String,
    pub output_path: String,
    pub detail_url: String,
    /// Size of the output file when the entry was written; always > 0.
    pub byte_size: u64,
    /// Unix seconds.
    pub completed_at: u64,
}

impl FetchLedgerEntry {
    pub fn completed_now(
        title: &str,
        output_path: &str,
        detail_url: &str,
        byte_size: u64,
    ) -> Self {
        let completed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            title: title.to_string(),
            output_path: output_path.to_string(),
            detail_url: detail_url.to_string(),
            byte_size,
            completed_at,
        }
    }
}

/// Ledger shared by fetch workers. All writes go through the mutex, so the
/// read-modify-write of `fetched.json` is serialized.
pub type SharedLedger = Arc<tokio::sync::Mutex<FetchLedger>>;

#[derive(Debug)]
pub struct FetchLedger {
    path: PathBuf,
    entries: BTreeMap<String, FetchLedgerEntry>,
}

impl FetchLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads `path`, or starts empty when it does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = load_json(&path)?.unwrap_or_default();
        Ok(Self { path, entries })
    }

    pub fn into_shared(self) -> SharedLedger {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, media_url: &str) -> bool {
        self.entries.contains_key(media_url)
    }

    pub fn get(&self, media_url: &str) -> Option<&FetchLedgerEntry> {
        self.entries.get(media_url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a completed download and persists the ledger before returning.
    /// On a failed write the in-memory entry is rolled back so memory never
    /// claims more than the file does.
    pub fn record(&mut self, media_url: &str, entry: FetchLedgerEntry) -> Result<()> {
        let previous = self.entries.insert(media_url.to_string(), entry);
        if let Err(e) = save_json(&self.path, &self.entries) {
            match previous {
                Some(prev) => self.entries.insert(media_url.to_string(), prev),
                None => self.entries.remove(media_url),
            };
            return Err(e);
        }
        Ok(())
    }
}
