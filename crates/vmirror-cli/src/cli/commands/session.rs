//! Browser start-up and login shared by `crawl` and `resolve`.

use anyhow::{Context, Result};
use vmirror_core::browse::{ChromiumSession, WaitBudget};
use vmirror_core::config::MirrorConfig;
use vmirror_core::session::{authenticate, Credentials};

use crate::cli::LoginArgs;

/// Launches the browser and logs in. The browser is closed again if login fails.
pub async fn open_session(cfg: &MirrorConfig, login: &LoginArgs) -> Result<ChromiumSession> {
    let mut session = ChromiumSession::launch(&cfg.browser)
        .await
        .context("launch browser")?;
    let credentials = Credentials {
        email: login.email.clone(),
        password: login.password.clone(),
    };
    let budget = WaitBudget::from_config(&cfg.waits);
    if let Err(e) = authenticate(&mut session, &cfg.site, &cfg.selectors, &credentials, budget).await {
        close_session(&mut session).await;
        return Err(e.into());
    }
    Ok(session)
}

pub async fn close_session(session: &mut ChromiumSession) {
    if let Err(e) = session.close().await {
        tracing::debug!(error = %e, "browser did not close cleanly");
    }
}
