//! Depth-first walk of the catalogue menu.

use anyhow::Result;

use super::breadcrumb::Breadcrumb;
use super::discover::Discoverer;
use crate::browse::{wait_for_present, Browser, BrowseResult, Locator, WaitBudget};
use crate::config::{MirrorConfig, Selectors};
use crate::control::StopSignal;
use crate::manifest::CrawlManifest;
use crate::retry::{run_with_retry, RetryPolicy};

/// Label used when a menu entry renders no text at all.
const UNLABELLED: &str = "Untitled Section";

/// A menu entry as observed after activating it. Rebuilt on every traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNode {
    pub label: String,
    pub kind: MenuKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuKind {
    /// Entry with nested entries; `children` lists them in document order.
    Branch { children: Locator, count: usize },
    /// Entry whose activation shows a content grid.
    Leaf,
}

/// Totals for one traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub sections: usize,
    pub added: usize,
    pub duplicates: usize,
    /// Cards skipped inside sections.
    pub failed_items: usize,
    /// Menu entries or sections abandoned after a browser error.
    pub failed_entries: usize,
    pub stopped: bool,
}

pub struct Navigator<'a> {
    selectors: &'a Selectors,
    discoverer: Discoverer<'a>,
    budget: WaitBudget,
    retry: RetryPolicy,
    stop: &'a StopSignal,
}

impl<'a> Navigator<'a> {
    pub fn new(cfg: &'a MirrorConfig, stop: &'a StopSignal) -> Self {
        Self {
            selectors: &cfg.selectors,
            discoverer: Discoverer::from_config(cfg),
            budget: WaitBudget::from_config(&cfg.waits),
            retry: cfg.retry_policy(),
            stop,
        }
    }

    /// Walks every top-level menu entry and its descendants, feeding each leaf
    /// section into `manifest`.
    ///
    /// Browser failures on one entry are logged and the walk moves on to the
    /// next sibling. Only a failure to persist the manifest is returned.
    pub async fn traverse<B>(&self, browser: &mut B, manifest: &mut CrawlManifest) -> Result<CrawlReport>
    where
        B: Browser + ?Sized,
    {
        let mut crumbs = Breadcrumb::new();
        let mut report = CrawlReport::default();
        let root = Locator::css(&self.selectors.menu_items);
        self.visit_level(browser, &root, &mut crumbs, manifest, &mut report).await?;
        report.stopped = self.stop.is_stopped();
        Ok(report)
    }

    async fn visit_level<B>(
        &self,
        browser: &mut B,
        entries: &Locator,
        crumbs: &mut Breadcrumb,
        manifest: &mut CrawlManifest,
        report: &mut CrawlReport,
    ) -> Result<()>
    where
        B: Browser + ?Sized,
    {
        let count = match run_with_retry(&self.retry, browser, async |b: &mut B| b.count(entries).await).await {
            Ok(n) => n,
            Err(e) => {
                report.failed_entries += 1;
                tracing::warn!(path = %crumbs.joined(), error = %e, "could not list menu entries");
                return Ok(());
            }
        };
        if count == 0 && crumbs.depth() == 0 {
            tracing::warn!(locator = %entries, "catalogue menu is empty");
        }

        for index in 0..count {
            if self.stop.is_stopped() {
                break;
            }
            let entry = entries.clone().nth(index);
            self.visit_entry(browser, entry, index, crumbs, manifest, report).await?;
        }
        Ok(())
    }

    async fn visit_entry<B>(
        &self,
        browser: &mut B,
        entry: Locator,
        index: usize,
        crumbs: &mut Breadcrumb,
        manifest: &mut CrawlManifest,
        report: &mut CrawlReport,
    ) -> Result<()>
    where
        B: Browser + ?Sized,
    {
        if let Err(e) = run_with_retry(&self.retry, browser, async |b: &mut B| {
            b.scroll_into_view(&entry).await?;
            b.hover(&entry).await
        })
        .await
        {
            report.failed_entries += 1;
            tracing::warn!(path = %crumbs.joined(), index, error = %e, "menu entry not interactable, skipping");
            return Ok(());
        }

        let label = self.read_label(browser, &entry).await;
        let mut scope = crumbs.enter(label.clone());
        tracing::info!(section = %scope.joined(), "processing section");

        let node = match self.activate(browser, &entry, label).await {
            Ok(node) => node,
            Err(e) => {
                report.failed_entries += 1;
                tracing::warn!(section = %scope.joined(), error = %e, "could not open menu entry, skipping");
                return Ok(());
            }
        };

        match node.kind {
            MenuKind::Branch { children, count } => {
                tracing::debug!(section = %scope.joined(), label = %node.label, children = count, "descending");
                Box::pin(self.visit_level(browser, &children, &mut scope, manifest, report)).await
            }
            MenuKind::Leaf => self.visit_leaf(browser, &scope, manifest, report).await,
        }
    }

    /// Clicks the entry and inspects what it reveals.
    async fn activate<B>(&self, browser: &mut B, entry: &Locator, label: String) -> BrowseResult<MenuNode>
    where
        B: Browser + ?Sized,
    {
        run_with_retry(&self.retry, browser, async |b: &mut B| b.click(entry).await).await?;
        let children = entry.child(&self.selectors.menu_children);
        let count = run_with_retry(&self.retry, browser, async |b: &mut B| b.count(&children).await).await?;
        let kind = if count > 0 {
            MenuKind::Branch { children, count }
        } else {
            MenuKind::Leaf
        };
        Ok(MenuNode { label, kind })
    }

    async fn visit_leaf<B>(
        &self,
        browser: &mut B,
        crumbs: &Breadcrumb,
        manifest: &mut CrawlManifest,
        report: &mut CrawlReport,
    ) -> Result<()>
    where
        B: Browser + ?Sized,
    {
        let section = crumbs.joined();
        let container = self.discoverer.container();
        let outcome = match wait_for_present(browser, &container, self.budget).await {
            Ok(_) => self.discoverer.discover(browser, &section, manifest, self.stop).await,
            Err(e) => Err(e),
        };
        let sect = match outcome {
            Ok(sect) => sect,
            Err(e) => {
                report.failed_entries += 1;
                tracing::warn!(section = %section, error = %e, "section failed, moving on");
                return Ok(());
            }
        };

        report.sections += 1;
        report.added += sect.added;
        report.duplicates += sect.duplicates;
        report.failed_items += sect.failed;
        if sect.added > 0 {
            manifest.save()?;
            tracing::debug!(section = %section, total = manifest.len(), "crawl manifest saved");
        }
        Ok(())
    }

    /// Label of a menu entry: its label element, else the first line of its
    /// text, else a placeholder.
    async fn read_label<B>(&self, browser: &mut B, entry: &Locator) -> String
    where
        B: Browser + ?Sized,
    {
        let label_loc = entry.child(&self.selectors.menu_label);
        for loc in [&label_loc, entry] {
            if let Ok(text) = run_with_retry(&self.retry, browser, async |b: &mut B| b.text(loc).await).await {
                if let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
                    return line.to_string();
                }
            }
        }
        UNLABELLED.to_string()
    }
}
