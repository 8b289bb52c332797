//! `vmirror status` – show progress of each stage.

use anyhow::Result;
use vmirror_core::manifest::StatePaths;
use vmirror_core::status::PipelineStatus;

pub fn run_status(paths: &StatePaths) -> Result<()> {
    let s = PipelineStatus::load(paths)?;
    println!("{:<10} {:>8} {:>8}", "STAGE", "DONE", "PENDING");
    println!("{:<10} {:>8} {:>8}", "crawl", s.crawled, "-");
    println!("{:<10} {:>8} {:>8}", "resolve", s.resolved, s.pending_resolution);
    println!("{:<10} {:>8} {:>8}", "fetch", s.fetched, s.pending_fetch);
    Ok(())
}
