//! `vmirror resolve` – stage 2.

use anyhow::Result;
use vmirror_core::config::MirrorConfig;
use vmirror_core::control::StopSignal;
use vmirror_core::manifest::StatePaths;
use vmirror_core::resolver::run_resolve;

use super::session::{close_session, open_session};
use crate::cli::LoginArgs;

pub async fn run_resolve_cmd(
    cfg: &MirrorConfig,
    paths: &StatePaths,
    login: &LoginArgs,
    stop: &StopSignal,
) -> Result<()> {
    let mut session = open_session(cfg, login).await?;
    let result = run_resolve(&mut session, cfg, paths, stop).await;
    close_session(&mut session).await;
    let report = result?;

    println!(
        "Resolved {} item(s), {} already resolved, {} failed (retried on the next run).",
        report.resolved, report.skipped, report.failed
    );
    println!("Manifest: {}", paths.extracted().display());
    if report.stopped {
        println!("Stopped early; run again to continue.");
    }
    Ok(())
}
