//! Bounded waits on remote page state.

use std::time::Duration;
use tokio::time::Instant;

use super::{Browser, BrowseError, BrowseResult, Locator};
use crate::config::WaitConfig;
use crate::retry::{classify, ErrorKind};

/// Upper bound and polling interval for one wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitBudget {
    pub timeout: Duration,
    pub poll: Duration,
}

impl WaitBudget {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }

    pub fn from_config(cfg: &WaitConfig) -> Self {
        Self::new(cfg.timeout(), cfg.poll())
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// Errors that mean "not there yet" while polling.
fn keep_polling(e: &BrowseError) -> bool {
    matches!(e, BrowseError::NotFound { .. }) || classify(e) == ErrorKind::Transient
}

/// Waits until `locator` matches at least one element; returns the match count.
pub async fn wait_for_present<B>(
    browser: &mut B,
    locator: &Locator,
    budget: WaitBudget,
) -> BrowseResult<usize>
where
    B: Browser + ?Sized,
{
    let deadline = Instant::now() + budget.timeout;
    loop {
        match browser.count(locator).await {
            Ok(n) if n > 0 => return Ok(n),
            Ok(_) => {}
            Err(e) if keep_polling(&e) => {}
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            return Err(BrowseError::Timeout {
                what: format!("{locator} to appear"),
                after: budget.timeout,
            });
        }
        tokio::time::sleep(budget.poll).await;
    }
}

/// Waits until `locator` is not rendered. An absent element counts as hidden,
/// so a missing busy indicator returns immediately.
pub async fn wait_until_hidden<B>(
    browser: &mut B,
    locator: &Locator,
    budget: WaitBudget,
) -> BrowseResult<()>
where
    B: Browser + ?Sized,
{
    let deadline = Instant::now() + budget.timeout;
    loop {
        match browser.is_visible(locator).await {
            Ok(false) | Err(BrowseError::NotFound { .. }) => return Ok(()),
            Ok(true) => {}
            Err(e) if keep_polling(&e) => {}
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            return Err(BrowseError::Timeout {
                what: format!("{locator} to clear"),
                after: budget.timeout,
            });
        }
        tokio::time::sleep(budget.poll).await;
    }
}
