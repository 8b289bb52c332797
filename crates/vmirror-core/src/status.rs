//! Progress summary across the three stage files.

use anyhow::Result;

use crate::manifest::{CrawlManifest, FetchLedger, ResolutionManifest, StatePaths};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStatus {
    pub crawled: usize,
    pub resolved: usize,
    /// Crawled items with no resolution record yet.
    pub pending_resolution: usize,
    pub fetched: usize,
    /// Resolved items whose media URL is not in the ledger.
    pub pending_fetch: usize,
}

impl PipelineStatus {
    /// Reads the stage files under `paths`; missing files count as empty.
    pub fn load(paths: &StatePaths) -> Result<Self> {
        let crawled = CrawlManifest::load(paths.crawled())?;
        let resolved = ResolutionManifest::load(paths.extracted())?;
        let ledger = FetchLedger::load(paths.fetched())?;

        let pending_resolution = crawled
            .records()
            .iter()
            .filter(|v| !resolved.contains(&v.detail_url))
            .count();
        let pending_fetch = resolved
            .records()
            .iter()
            .filter(|r| !ledger.contains(&r.media_url))
            .count();

        Ok(Self {
            crawled: crawled.len(),
            resolved: resolved.len(),
            pending_resolution,
            fetched: ledger.len(),
            pending_fetch,
        })
    }
}
