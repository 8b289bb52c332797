//! Durable stage outputs.
//!
//! Stages never hand records to each other in memory; each one reads the
//! previous stage's file and writes its own:
//! - `crawled.json`: discovered items (`CrawlManifest`)
//! - `extracted.json`: resolved media references (`ResolutionManifest`)
//! - `fetched.json`: completed downloads (`FetchLedger`)
//!
//! The two record manifests share one deduplicating container, `Manifest<R>`,
//! keyed by the detail-page URL.

mod crawl;
mod ledger;
mod persist;
mod resolution;

pub use crawl::{VideoRecord, UNKNOWN_TITLE};
pub use ledger::{FetchLedger, FetchLedgerEntry, SharedLedger};
pub use persist::{load_json, save_json, TEMP_SUFFIX};
pub use resolution::ResolutionRecord;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CRAWLED_FILE: &str = "crawled.json";
pub const EXTRACTED_FILE: &str = "extracted.json";
pub const FETCHED_FILE: &str = "fetched.json";

pub type CrawlManifest = Manifest<VideoRecord>;
pub type ResolutionManifest = Manifest<ResolutionRecord>;

/// A record that can live in a `Manifest`.
pub trait ManifestRecord: Serialize + DeserializeOwned {
    /// Unique key; at most one record per key is kept.
    fn key(&self) -> &str;
}

/// Location of the three stage files.
#[derive(Debug, Clone)]
pub struct StatePaths {
    dir: PathBuf,
}

impl StatePaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn crawled(&self) -> PathBuf {
        self.dir.join(CRAWLED_FILE)
    }

    pub fn extracted(&self) -> PathBuf {
        self.dir.join(EXTRACTED_FILE)
    }

    pub fn fetched(&self) -> PathBuf {
        self.dir.join(FETCHED_FILE)
    }
}

/// Append-only, deduplicated record list backed by a JSON array on disk.
///
/// Insertion order is kept for readability of the file but is not part of the
/// contract; uniqueness of `key()` is.
#[derive(Debug)]
pub struct Manifest<R> {
    path: PathBuf,
    records: Vec<R>,
    keys: HashSet<String>,
}

impl<R: ManifestRecord> Manifest<R> {
    /// Empty manifest that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            keys: HashSet::new(),
        }
    }

    /// Loads `path`, or starts empty when it does not exist yet. Duplicate keys
    /// in the file (hand edits, older tooling) collapse to their first occurrence.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let mut manifest = Self::new(path);
        let loaded: Vec<R> = load_json(&manifest.path)?.unwrap_or_default();
        let total = loaded.len();
        for record in loaded {
            manifest.insert(record);
        }
        if manifest.len() < total {
            tracing::warn!(
                path = %manifest.path.display(),
                dropped = total - manifest.len(),
                "collapsed duplicate manifest entries"
            );
        }
        Ok(manifest)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Adds `record` unless its key is already present. Returns whether it was added.
    pub fn insert(&mut self, record: R) -> bool {
        if !self.keys.insert(record.key().to_string()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Atomically rewrites the backing file with the current records.
    pub fn save(&self) -> Result<()> {
        save_json(&self.path, &self.records)
    }
}
