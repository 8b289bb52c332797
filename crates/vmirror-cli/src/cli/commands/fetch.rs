//! `vmirror fetch` – stage 3.

use anyhow::Result;
use std::path::PathBuf;
use vmirror_core::config::MirrorConfig;
use vmirror_core::control::StopSignal;
use vmirror_core::fetch::{run_fetch, CommandDownloader, FetchPlan};
use vmirror_core::manifest::StatePaths;

pub async fn run_fetch_cmd(
    cfg: &MirrorConfig,
    paths: &StatePaths,
    dest_root: PathBuf,
    input: Option<PathBuf>,
    force: bool,
    jobs: Option<usize>,
    stop: &StopSignal,
) -> Result<()> {
    let downloader = CommandDownloader::locate(&cfg.fetch.downloader, cfg.fetch.extra_args.clone())?;

    let mut plan = FetchPlan::new(paths, dest_root, jobs.unwrap_or(cfg.fetch.workers));
    if let Some(input) = input {
        plan.input = input;
    }
    plan.force = force;

    let summary = run_fetch(downloader, &plan, paths, stop).await?;
    println!(
        "Downloaded {}, skipped {}, failed {}.",
        summary.downloaded, summary.skipped, summary.failed
    );
    if summary.not_started > 0 {
        println!("Stopped early; {} item(s) not started.", summary.not_started);
    }
    println!("Ledger: {}", paths.fetched().display());
    Ok(())
}
