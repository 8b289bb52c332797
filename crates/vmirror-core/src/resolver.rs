//! Stage 2: resolve each crawled detail page to its embedded media URL.
//!
//! Reads `crawled.json`, writes `extracted.json`. A record that fails to
//! resolve is left out of the output so the next run tries it again.

use anyhow::{Context, Result};

use crate::browse::{wait_for_present, Browser, BrowseError, Locator, WaitBudget};
use crate::config::MirrorConfig;
use crate::control::StopSignal;
use crate::manifest::{CrawlManifest, ResolutionManifest, ResolutionRecord, StatePaths, VideoRecord};
use crate::retry::{run_with_retry, RetryPolicy};

/// Why a detail page did not yield a media URL. Never fatal to the stage.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("could not load detail page: {0}")]
    Navigation(#[source] BrowseError),

    #[error("no embedded player on page: {0}")]
    NoFrame(#[source] BrowseError),

    /// Frames were found but none points at the expected media provider.
    #[error("embedded frame is not a {signature} player (src: {found:?})")]
    Mismatch { signature: String, found: Option<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub resolved: usize,
    /// Records already present in `extracted.json`.
    pub skipped: usize,
    pub failed: usize,
    pub stopped: bool,
}

pub struct UrlResolver<'a> {
    frame: Locator,
    signature: &'a str,
    extension: &'a str,
    budget: WaitBudget,
    retry: RetryPolicy,
}

impl<'a> UrlResolver<'a> {
    pub fn from_config(cfg: &'a MirrorConfig) -> Self {
        Self {
            frame: Locator::css(&cfg.selectors.media_frame),
            signature: &cfg.resolver.provider_signature,
            extension: &cfg.resolver.extension,
            budget: WaitBudget::from_config(&cfg.waits),
            retry: cfg.retry_policy(),
        }
    }

    /// Loads `detail_url` and returns the first frame source containing the provider signature.
    pub async fn media_url<B>(&self, browser: &mut B, detail_url: &str) -> Result<String, ResolveError>
    where
        B: Browser + ?Sized,
    {
        browser.goto(detail_url).await.map_err(ResolveError::Navigation)?;
        let frames = wait_for_present(browser, &self.frame, self.budget)
            .await
            .map_err(ResolveError::NoFrame)?;

        let mut first_src = None;
        for index in 0..frames {
            let frame = self.frame.clone().nth(index);
            let src = run_with_retry(&self.retry, browser, async |b: &mut B| b.attribute(&frame, "src").await)
                .await
                .map_err(ResolveError::NoFrame)?;
            let Some(src) = src else { continue };
            if src.contains(self.signature) {
                return Ok(src);
            }
            first_src.get_or_insert(src);
        }
        Err(ResolveError::Mismatch {
            signature: self.signature.to_string(),
            found: first_src,
        })
    }

    /// Resolves one crawled record into its resolution record.
    pub async fn resolve<B>(&self, browser: &mut B, video: &VideoRecord) -> Result<ResolutionRecord, ResolveError>
    where
        B: Browser + ?Sized,
    {
        let media_url = self.media_url(browser, &video.detail_url).await?;
        Ok(ResolutionRecord::for_video(video, media_url, self.extension))
    }
}

/// Runs the resolve stage on an already authenticated browser.
///
/// Records already in `extracted.json` are skipped without touching the
/// browser. Each newly resolved record is saved before the next one starts.
pub async fn run_resolve<B>(
    browser: &mut B,
    cfg: &MirrorConfig,
    paths: &StatePaths,
    stop: &StopSignal,
) -> Result<ResolveReport>
where
    B: Browser + ?Sized,
{
    let crawled = CrawlManifest::load(paths.crawled())
        .with_context(|| format!("load crawl manifest {}", paths.crawled().display()))?;
    let mut resolved = ResolutionManifest::load(paths.extracted())
        .with_context(|| format!("load resolution manifest {}", paths.extracted().display()))?;
    tracing::info!(crawled = crawled.len(), known = resolved.len(), "starting resolve");

    let resolver = UrlResolver::from_config(cfg);
    let mut report = ResolveReport::default();

    for video in crawled.records() {
        if resolved.contains(&video.detail_url) {
            report.skipped += 1;
            tracing::trace!(url = %video.detail_url, "already resolved");
            continue;
        }
        if stop.is_stopped() {
            report.stopped = true;
            break;
        }

        match resolver.resolve(browser, video).await {
            Ok(record) => {
                tracing::info!(title = %video.title, media = %record.media_url, "resolved");
                resolved.insert(record);
                resolved.save()?;
                report.resolved += 1;
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(title = %video.title, url = %video.detail_url, error = %e, "could not resolve");
            }
        }
    }

    tracing::info!(
        resolved = report.resolved,
        skipped = report.skipped,
        failed = report.failed,
        total = resolved.len(),
        "resolve finished"
    );
    Ok(report)
}
