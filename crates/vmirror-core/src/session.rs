//! Session provider: logs the browsing context in before any stage runs.

use crate::browse::{wait_for_present, Browser, Locator, WaitBudget};
use crate::config::{Selectors, SiteConfig};
use crate::error::PipelineError;

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fills the login form and blocks until the post-login marker is present.
///
/// Failing to reach or fill the form is a session error; the marker not
/// appearing within `budget` is `AuthFailure`. Either one aborts the run.
pub async fn authenticate<B>(
    browser: &mut B,
    site: &SiteConfig,
    selectors: &Selectors,
    credentials: &Credentials,
    budget: WaitBudget,
) -> Result<(), PipelineError>
where
    B: Browser + ?Sized,
{
    browser.goto(&site.login_url).await?;

    let email = Locator::css(&selectors.login_email);
    wait_for_present(browser, &email, budget).await?;
    browser.type_text(&email, &credentials.email).await?;

    let password = Locator::css(&selectors.login_password);
    wait_for_present(browser, &password, budget).await?;
    browser.type_text(&password, &credentials.password).await?;

    let submit = Locator::css(&selectors.login_submit);
    wait_for_present(browser, &submit, budget).await?;
    browser.click(&submit).await?;

    let marker = Locator::css(&selectors.post_login_marker);
    wait_for_present(browser, &marker, budget)
        .await
        .map_err(PipelineError::AuthFailure)?;

    tracing::info!(email = %credentials.email, "logged in");
    Ok(())
}
