//! `vmirror crawl` – stage 1.

use anyhow::Result;
use vmirror_core::catalogue::run_crawl;
use vmirror_core::config::MirrorConfig;
use vmirror_core::control::StopSignal;
use vmirror_core::manifest::StatePaths;

use super::session::{close_session, open_session};
use crate::cli::LoginArgs;

pub async fn run_crawl_cmd(
    cfg: &MirrorConfig,
    paths: &StatePaths,
    login: &LoginArgs,
    stop: &StopSignal,
) -> Result<()> {
    let mut session = open_session(cfg, login).await?;
    let result = run_crawl(&mut session, cfg, paths, stop).await;
    close_session(&mut session).await;
    let report = result?;

    println!(
        "Crawled {} section(s): {} new item(s), {} already known, {} unreadable, {} menu entr(ies) failed.",
        report.sections, report.added, report.duplicates, report.failed_items, report.failed_entries
    );
    println!("Manifest: {}", paths.crawled().display());
    if report.stopped {
        println!("Stopped early; run again to continue.");
    }
    Ok(())
}
