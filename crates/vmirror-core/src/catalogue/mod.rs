//! Stage 1: crawl the catalogue into `crawled.json`.

mod breadcrumb;
mod discover;
mod growth;
mod navigator;

pub use breadcrumb::{Breadcrumb, BreadcrumbScope, PATH_SEPARATOR};
pub use discover::{Discoverer, SectionReport};
pub use growth::{DiscoveryState, GrowthTracker};
pub use navigator::{CrawlReport, MenuKind, MenuNode, Navigator};

use anyhow::{Context, Result};

use crate::browse::Browser;
use crate::config::MirrorConfig;
use crate::control::StopSignal;
use crate::manifest::{CrawlManifest, StatePaths};

/// Runs the crawl stage on an already authenticated browser.
///
/// Records from a previous `crawled.json` seed the duplicate set, so re-running
/// only appends what is new. The manifest is saved after each section that
/// added records and once more at the end.
pub async fn run_crawl<B>(
    browser: &mut B,
    cfg: &MirrorConfig,
    paths: &StatePaths,
    stop: &StopSignal,
) -> Result<CrawlReport>
where
    B: Browser + ?Sized,
{
    let mut manifest = CrawlManifest::load(paths.crawled())
        .with_context(|| format!("load crawl manifest {}", paths.crawled().display()))?;
    let known = manifest.len();
    tracing::info!(known, path = %manifest.path().display(), "starting crawl");

    let navigator = Navigator::new(cfg, stop);
    let report = navigator.traverse(browser, &mut manifest).await?;
    manifest.save()?;

    tracing::info!(
        sections = report.sections,
        added = report.added,
        duplicates = report.duplicates,
        failed_items = report.failed_items,
        failed_entries = report.failed_entries,
        total = manifest.len(),
        stopped = report.stopped,
        "crawl finished"
    );
    Ok(report)
}
