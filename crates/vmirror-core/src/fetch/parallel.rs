//! Run fetches with a bounded number in flight.
//!
//! Keeps up to `workers` fetches running; when one finishes the next record
//! starts, until the list is done or a stop is requested.

use std::sync::Arc;

use super::downloader::Downloader;
use super::manager::{FetchManager, FetchOutcome};
use crate::control::StopSignal;
use crate::manifest::ResolutionRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Records never started because a stop was requested.
    pub not_started: usize,
}

impl FetchSummary {
    fn add(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Downloaded { .. } => self.downloaded += 1,
            FetchOutcome::Skipped(_) => self.skipped += 1,
            FetchOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Fetches every record, at most `workers` at a time. Per-record failures are
/// logged and counted; they never stop the other records.
pub async fn fetch_all<D>(
    manager: Arc<FetchManager<D>>,
    records: Vec<ResolutionRecord>,
    workers: usize,
    force: bool,
    stop: &StopSignal,
) -> FetchSummary
where
    D: Downloader + 'static,
{
    let workers = workers.max(1);
    let total = records.len();
    let mut queue = records.into_iter();
    let mut summary = FetchSummary::default();
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < workers && !stop.is_stopped() {
            let Some(record) = queue.next() else {
                break;
            };
            let manager = Arc::clone(&manager);
            join_set.spawn(async move {
                let outcome = manager.fetch(&record, force).await;
                (record, outcome)
            });
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok((record, outcome)) => {
                match &outcome {
                    FetchOutcome::Downloaded { bytes } => {
                        tracing::info!(title = %record.title, bytes, "downloaded")
                    }
                    FetchOutcome::Skipped(reason) => {
                        tracing::debug!(title = %record.title, ?reason, "skipped")
                    }
                    FetchOutcome::Failed(reason) => {
                        tracing::warn!(title = %record.title, url = %record.media_url, error = %reason, "download failed")
                    }
                }
                summary.add(&outcome);
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(error = %e, "fetch task join");
            }
        }
    }

    summary.not_started = total - summary.downloaded - summary.skipped - summary.failed;
    if summary.not_started > 0 {
        tracing::info!(not_started = summary.not_started, "stop requested, remaining records left for the next run");
    }
    summary
}
