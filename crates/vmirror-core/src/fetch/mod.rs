//! Stage 3: download resolved media and keep the fetch ledger.

mod downloader;
mod manager;
mod parallel;

pub use downloader::{find_executable, CommandDownloader, DownloadError, DownloadJob, Downloader};
pub use manager::{FetchManager, FetchOutcome, SkipReason};
pub use parallel::{fetch_all, FetchSummary};

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::control::StopSignal;
use crate::manifest::{FetchLedger, ResolutionManifest, StatePaths};

/// Inputs of one fetch run.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    /// Resolution manifest to read.
    pub input: PathBuf,
    /// Root directory that record output paths are relative to.
    pub dest_root: PathBuf,
    pub workers: usize,
    pub force: bool,
}

impl FetchPlan {
    /// Plan reading `extracted.json` from the state directory.
    pub fn new(paths: &StatePaths, dest_root: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            input: paths.extracted(),
            dest_root: dest_root.into(),
            workers,
            force: false,
        }
    }
}

/// Runs the fetch stage with `downloader`. The ledger lives in the state
/// directory and is saved after every successful download.
pub async fn run_fetch<D>(
    downloader: D,
    plan: &FetchPlan,
    paths: &StatePaths,
    stop: &StopSignal,
) -> Result<FetchSummary>
where
    D: Downloader + 'static,
{
    let resolved = ResolutionManifest::load(&plan.input)
        .with_context(|| format!("load resolution manifest {}", plan.input.display()))?;
    let ledger = FetchLedger::load(paths.fetched())
        .with_context(|| format!("load fetch ledger {}", paths.fetched().display()))?;
    tracing::info!(
        records = resolved.len(),
        fetched = ledger.len(),
        dest = %plan.dest_root.display(),
        workers = plan.workers,
        "starting fetch"
    );

    let manager = Arc::new(FetchManager::new(downloader, &plan.dest_root, ledger.into_shared()));
    let summary = fetch_all(manager, resolved.records().to_vec(), plan.workers, plan.force, stop).await;

    tracing::info!(
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        not_started = summary.not_started,
        "fetch finished"
    );
    Ok(summary)
}
