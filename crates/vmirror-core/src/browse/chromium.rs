//! `Browser` implementation over the Chrome DevTools Protocol (chromiumoxide).

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{Browser, BrowseError, BrowseResult, Locator, Pick};
use crate::config::BrowserConfig;

/// Flags that keep a backgrounded window loading content at full speed.
const BACKGROUND_FLAGS: [&str; 3] = [
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
];

const VISIBLE_JS: &str = "function() { \
    const s = window.getComputedStyle(this); \
    return s.display !== 'none' && s.visibility !== 'hidden'; }";

/// A launched Chromium process with one page, used as the single browsing context.
pub struct ChromiumSession {
    browser: CdpBrowser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launches the browser and opens a blank page.
    pub async fn launch(cfg: &BrowserConfig) -> BrowseResult<Self> {
        let mut builder = CdpConfig::builder();
        if !cfg.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &cfg.executable {
            builder = builder.chrome_executable(path);
        }
        for flag in BACKGROUND_FLAGS {
            builder = builder.arg(flag);
        }
        for flag in &cfg.extra_args {
            builder = builder.arg(flag.as_str());
        }
        let config = builder.build().map_err(BrowseError::Driver)?;

        let (browser, mut events) = CdpBrowser::launch(config).await.map_err(driver_error)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });
        let page = browser.new_page("about:blank").await.map_err(driver_error)?;
        tracing::debug!(headless = cfg.headless, "chromium session started");

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Closes the browser process. Safe to call once at the end of a stage.
    pub async fn close(&mut self) -> BrowseResult<()> {
        self.browser.close().await.map_err(driver_error)?;
        let _ = self.browser.wait().await;
        Ok(())
    }

    /// Resolves every element the locator currently selects, walking its steps from the page root.
    async fn resolve(&self, locator: &Locator) -> BrowseResult<Vec<Element>> {
        let steps = locator.steps();
        let mut scope: Option<Element> = None;
        for (i, step) in steps.iter().enumerate() {
            let found = match &scope {
                None => self.page.find_elements(step.css.as_str()).await,
                Some(parent) => parent.find_elements(step.css.as_str()).await,
            }
            .map_err(|e| classify_cdp(locator, e))?;

            let is_last = i + 1 == steps.len();
            if is_last && step.pick == Pick::All {
                return Ok(found);
            }
            let picked = step
                .pick
                .index(found.len())
                .and_then(|idx| found.into_iter().nth(idx));
            match (picked, is_last) {
                (Some(el), true) => return Ok(vec![el]),
                (Some(el), false) => scope = Some(el),
                (None, true) => return Ok(Vec::new()),
                (None, false) => return Err(BrowseError::not_found(locator)),
            }
        }
        Ok(Vec::new())
    }

    async fn single(&self, locator: &Locator) -> BrowseResult<Element> {
        self.resolve(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowseError::not_found(locator))
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn driver_error(e: CdpError) -> BrowseError {
    BrowseError::Driver(e.to_string())
}

/// Maps protocol errors onto the browse taxonomy by their DevTools message.
fn classify_cdp(locator: &Locator, e: CdpError) -> BrowseError {
    let msg = e.to_string();
    if msg.contains("Could not find node")
        || msg.contains("No node with given id")
        || msg.contains("detached")
    {
        BrowseError::stale(locator)
    } else if msg.contains("box model") || msg.contains("not visible") {
        BrowseError::NotInteractable {
            locator: locator.to_string(),
        }
    } else {
        BrowseError::Driver(msg)
    }
}

#[async_trait]
impl Browser for ChromiumSession {
    async fn goto(&mut self, url: &str) -> BrowseResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowseError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn count(&mut self, locator: &Locator) -> BrowseResult<usize> {
        Ok(self.resolve(locator).await?.len())
    }

    async fn text(&mut self, locator: &Locator) -> BrowseResult<String> {
        let el = self.single(locator).await?;
        let text = el
            .inner_text()
            .await
            .map_err(|e| classify_cdp(locator, e))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&mut self, locator: &Locator, name: &str) -> BrowseResult<Option<String>> {
        let el = self.single(locator).await?;
        el.attribute(name)
            .await
            .map_err(|e| classify_cdp(locator, e))
    }

    async fn is_visible(&mut self, locator: &Locator) -> BrowseResult<bool> {
        let Some(el) = self.resolve(locator).await?.into_iter().next() else {
            return Ok(false);
        };
        let ret = el
            .call_js_fn(VISIBLE_JS, false)
            .await
            .map_err(|e| classify_cdp(locator, e))?;
        Ok(ret
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn scroll_into_view(&mut self, locator: &Locator) -> BrowseResult<()> {
        let el = self.single(locator).await?;
        el.scroll_into_view()
            .await
            .map_err(|e| classify_cdp(locator, e))?;
        Ok(())
    }

    async fn hover(&mut self, locator: &Locator) -> BrowseResult<()> {
        let el = self.single(locator).await?;
        el.hover().await.map_err(|e| classify_cdp(locator, e))?;
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> BrowseResult<()> {
        let el = self.single(locator).await?;
        el.click().await.map_err(|e| classify_cdp(locator, e))?;
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> BrowseResult<()> {
        let el = self.single(locator).await?;
        el.click().await.map_err(|e| classify_cdp(locator, e))?;
        el.type_str(text)
            .await
            .map_err(|e| classify_cdp(locator, e))?;
        Ok(())
    }
}
