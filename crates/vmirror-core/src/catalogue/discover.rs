//! Content discovery within one leaf section.
//!
//! The grid loads more cards each time the load trigger scrolls into view.
//! We keep triggering until the card count stops growing, then walk the list
//! once, re-acquiring every card by index right before reading it.

use std::time::Duration;

use super::growth::{DiscoveryState, GrowthTracker};
use crate::browse::{wait_for_present, wait_until_hidden, Browser, BrowseError, BrowseResult, Locator, WaitBudget};
use crate::config::{MirrorConfig, Selectors};
use crate::control::StopSignal;
use crate::manifest::{CrawlManifest, VideoRecord, UNKNOWN_TITLE};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::url_model::normalize_detail_url;

/// Counters for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionReport {
    /// Load triggers issued.
    pub triggers: u32,
    /// Cards listed when the feed was exhausted.
    pub listed: usize,
    /// New records added to the manifest.
    pub added: usize,
    /// Cards whose detail URL was already known.
    pub duplicates: usize,
    /// Cards skipped because they could not be read.
    pub failed: usize,
    pub final_state: DiscoveryState,
}

impl SectionReport {
    fn new() -> Self {
        Self {
            triggers: 0,
            listed: 0,
            added: 0,
            duplicates: 0,
            failed: 0,
            final_state: DiscoveryState::Loading,
        }
    }
}

enum CardOutcome {
    Added,
    Duplicate,
    /// The card's link did not resolve to a usable detail URL.
    Unusable(String),
}

/// Discovers the items of the currently displayed section.
pub struct Discoverer<'a> {
    selectors: &'a Selectors,
    base_url: &'a str,
    max_failed_attempts: u32,
    budget: WaitBudget,
    title_budget: WaitBudget,
    settle: Duration,
    retry: RetryPolicy,
}

impl<'a> Discoverer<'a> {
    pub fn from_config(cfg: &'a MirrorConfig) -> Self {
        let budget = WaitBudget::from_config(&cfg.waits);
        Self {
            selectors: &cfg.selectors,
            base_url: &cfg.site.base_url,
            max_failed_attempts: cfg.discovery.max_failed_attempts,
            budget,
            title_budget: budget.with_timeout(cfg.waits.title_timeout()),
            settle: cfg.waits.settle(),
            retry: cfg.retry_policy(),
        }
    }

    /// Live grid container: the last one on the page replaces earlier ones on each load.
    pub fn container(&self) -> Locator {
        Locator::css(&self.selectors.content_container).last()
    }

    fn cards(&self) -> Locator {
        self.container().child(&self.selectors.card)
    }

    /// Feeds the section until exhausted, then records every card not already in `manifest`.
    ///
    /// Per-card failures are logged and counted, never returned. An error is
    /// returned only when the card list itself cannot be read.
    pub async fn discover<B>(
        &self,
        browser: &mut B,
        section: &str,
        manifest: &mut CrawlManifest,
        stop: &StopSignal,
    ) -> BrowseResult<SectionReport>
    where
        B: Browser + ?Sized,
    {
        let mut report = SectionReport::new();
        report.final_state = self.feed(browser, section, stop, &mut report).await?;

        let cards = self.cards();
        let total = run_with_retry(&self.retry, browser, async |b: &mut B| b.count(&cards).await).await?;
        report.listed = total;

        for index in 0..total {
            if stop.is_stopped() {
                tracing::info!(section, index, "stop requested, leaving section early");
                break;
            }
            let card = cards.clone().nth(index);
            match self.extract_card(browser, &card, section, manifest).await {
                Ok(CardOutcome::Added) => report.added += 1,
                Ok(CardOutcome::Duplicate) => report.duplicates += 1,
                Ok(CardOutcome::Unusable(href)) => {
                    report.failed += 1;
                    tracing::warn!(section, index, href = %href, "card link is not a detail page, skipping");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(section, index, error = %e, "could not read card, skipping");
                }
            }
        }

        tracing::info!(
            section,
            listed = report.listed,
            added = report.added,
            duplicates = report.duplicates,
            failed = report.failed,
            triggers = report.triggers,
            "section done"
        );
        Ok(report)
    }

    /// Triggers incremental loads until the growth tracker reports exhaustion.
    async fn feed<B>(
        &self,
        browser: &mut B,
        section: &str,
        stop: &StopSignal,
        report: &mut SectionReport,
    ) -> BrowseResult<DiscoveryState>
    where
        B: Browser + ?Sized,
    {
        let cards = self.cards();
        let spinner = Locator::css(&self.selectors.spinner);
        let mut growth = GrowthTracker::new(self.max_failed_attempts);

        loop {
            if stop.is_stopped() {
                return Ok(growth.state());
            }
            growth.triggered();
            if let Err(e) = self.trigger_load(browser).await {
                tracing::warn!(section, error = %e, "load trigger unavailable, using cards listed so far");
                return Ok(growth.state());
            }
            report.triggers += 1;
            if !self.settle.is_zero() {
                tokio::time::sleep(self.settle).await;
            }

            if let Err(e) = wait_until_hidden(browser, &spinner, self.budget).await {
                tracing::debug!(section, error = %e, "busy indicator did not clear");
            }
            growth.settled();

            let count = run_with_retry(&self.retry, browser, async |b: &mut B| b.count(&cards).await).await?;
            let before = growth.last_seen();
            let state = growth.observe(count);
            if count > before {
                tracing::debug!(section, cards = count, "more cards loaded");
            } else {
                tracing::debug!(section, cards = count, stagnant = growth.no_growth(), "no new cards");
            }
            if state == DiscoveryState::Exhausted {
                return Ok(state);
            }
        }
    }

    async fn trigger_load<B>(&self, browser: &mut B) -> BrowseResult<()>
    where
        B: Browser + ?Sized,
    {
        let trigger = Locator::css(&self.selectors.load_trigger);
        wait_for_present(browser, &trigger, self.budget).await?;
        run_with_retry(&self.retry, browser, async |b: &mut B| b.scroll_into_view(&trigger).await).await
    }

    async fn extract_card<B>(
        &self,
        browser: &mut B,
        card: &Locator,
        section: &str,
        manifest: &mut CrawlManifest,
    ) -> BrowseResult<CardOutcome>
    where
        B: Browser + ?Sized,
    {
        let link = card.child(&self.selectors.card_link);
        let href = run_with_retry(&self.retry, browser, async |b: &mut B| b.attribute(&link, "href").await)
            .await?
            .unwrap_or_default();
        let Some(detail_url) = normalize_detail_url(self.base_url, &href) else {
            return Ok(CardOutcome::Unusable(href));
        };
        if manifest.contains(&detail_url) {
            tracing::trace!(section, url = %detail_url, "already known");
            return Ok(CardOutcome::Duplicate);
        }

        let title = self.read_title(browser, card).await?;
        tracing::debug!(section, title = %title, url = %detail_url, "found item");
        manifest.insert(VideoRecord {
            title,
            detail_url,
            path: section.to_string(),
        });
        Ok(CardOutcome::Added)
    }

    /// Card title, or the sentinel when the card renders none.
    async fn read_title<B>(&self, browser: &mut B, card: &Locator) -> BrowseResult<String>
    where
        B: Browser + ?Sized,
    {
        let title_loc = card.child(&self.selectors.card_title);
        match wait_for_present(browser, &title_loc, self.title_budget).await {
            Ok(_) => {}
            Err(BrowseError::Timeout { .. }) => return Ok(UNKNOWN_TITLE.to_string()),
            Err(e) => return Err(e),
        }
        let text = run_with_retry(&self.retry, browser, async |b: &mut B| b.text(&title_loc).await).await?;
        let title = text.trim();
        Ok(if title.is_empty() {
            UNKNOWN_TITLE.to_string()
        } else {
            title.to_string()
        })
    }
}
