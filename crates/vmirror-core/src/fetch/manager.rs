//! Idempotent fetch of one resolved record.

use std::path::{Path, PathBuf};

use super::downloader::{DownloadJob, Downloader};
use crate::manifest::{FetchLedgerEntry, ResolutionRecord, SharedLedger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The ledger already records this media URL.
    InLedger,
    /// A non-empty file is already at the output path but the ledger has no
    /// entry for it. Left as is and not added to the ledger.
    FileExists { bytes: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Skipped(SkipReason),
    Downloaded { bytes: u64 },
    Failed(String),
}

pub struct FetchManager<D> {
    downloader: D,
    dest_root: PathBuf,
    ledger: SharedLedger,
}

impl<D: Downloader> FetchManager<D> {
    pub fn new(downloader: D, dest_root: impl Into<PathBuf>, ledger: SharedLedger) -> Self {
        Self {
            downloader,
            dest_root: dest_root.into(),
            ledger,
        }
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    pub fn target_path(&self, record: &ResolutionRecord) -> PathBuf {
        self.dest_root.join(&record.output_path)
    }

    /// Downloads `record` unless it is already done.
    ///
    /// The ledger entry is written, and persisted, only after the output file
    /// is confirmed non-empty. A tool that exits 0 without producing a file is
    /// a failure. With `force` the ledger is ignored and an existing file is
    /// moved aside first, so only the new download can satisfy the check. The
    /// old file is put back when the new download fails.
    pub async fn fetch(&self, record: &ResolutionRecord, force: bool) -> FetchOutcome {
        let target = self.target_path(record);

        if !force {
            if self.ledger.lock().await.contains(&record.media_url) {
                tracing::debug!(title = %record.title, "already in ledger");
                return FetchOutcome::Skipped(SkipReason::InLedger);
            }
            if let Some(bytes) = non_empty_len(&target).await {
                tracing::info!(title = %record.title, path = %target.display(), "file exists without ledger entry, skipping");
                return FetchOutcome::Skipped(SkipReason::FileExists { bytes });
            }
        }

        if let Some(parent) = target.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return FetchOutcome::Failed(format!("create {}: {e}", parent.display()));
            }
        }

        let displaced = if force {
            match displace(&target).await {
                Ok(d) => d,
                Err(reason) => return FetchOutcome::Failed(reason),
            }
        } else {
            None
        };

        let outcome = self.download_into(record, &target).await;
        if let Some(aside) = displaced {
            settle_displaced(&aside, &target, outcome.is_ok()).await;
        }
        let bytes = match outcome {
            Ok(bytes) => bytes,
            Err(reason) => return FetchOutcome::Failed(reason),
        };

        let entry = FetchLedgerEntry::completed_now(&record.title, &record.output_path, &record.detail_url, bytes);
        if let Err(e) = self.ledger.lock().await.record(&record.media_url, entry) {
            return FetchOutcome::Failed(format!("downloaded but ledger not saved: {e:#}"));
        }
        FetchOutcome::Downloaded { bytes }
    }

    /// Runs the downloader and returns the size of the file it produced.
    async fn download_into(&self, record: &ResolutionRecord, target: &Path) -> Result<u64, String> {
        let job = DownloadJob {
            media_url: record.media_url.clone(),
            referer: record.detail_url.clone(),
            output: target.to_path_buf(),
        };
        tracing::info!(title = %record.title, url = %record.media_url, "downloading");
        self.downloader.download(&job).await.map_err(|e| e.to_string())?;
        non_empty_len(target).await.ok_or_else(|| {
            format!("downloader reported success but {} is missing or empty", target.display())
        })
    }
}

/// Sibling path an existing output is moved to during a forced download.
fn aside_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".replaced");
    target.with_file_name(name)
}

/// Moves an existing file at `target` out of the way. `Ok(None)` when there
/// was nothing to move.
async fn displace(target: &Path) -> Result<Option<PathBuf>, String> {
    match tokio::fs::metadata(target).await {
        Ok(m) if m.is_file() => {}
        _ => return Ok(None),
    }
    let aside = aside_path(target);
    tokio::fs::rename(target, &aside)
        .await
        .map_err(|e| format!("move aside {}: {e}", target.display()))?;
    tracing::debug!(path = %target.display(), "existing file moved aside for forced download");
    Ok(Some(aside))
}

/// Drops the displaced file after a good download, or restores it over
/// whatever partial output the failed attempt left behind.
async fn settle_displaced(aside: &Path, target: &Path, succeeded: bool) {
    let res = if succeeded {
        tokio::fs::remove_file(aside).await
    } else {
        tokio::fs::rename(aside, target).await
    };
    if let Err(e) = res {
        tracing::warn!(path = %aside.display(), error = %e, "could not settle displaced file");
    }
}

/// Size of the file at `path` when it exists and is non-empty.
async fn non_empty_len(path: &Path) -> Option<u64> {
    match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() && m.len() > 0 => Some(m.len()),
        _ => None,
    }
}
