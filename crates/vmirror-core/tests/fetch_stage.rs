//! Integration tests: fetch manager, ledger and worker pool with a fake downloader.

mod common;

use common::{resolution, Behavior, FakeDownloader};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use vmirror_core::control::StopSignal;
use vmirror_core::fetch::{fetch_all, run_fetch, FetchManager, FetchOutcome, FetchPlan, SkipReason};
use vmirror_core::manifest::{FetchLedger, FetchLedgerEntry, ResolutionManifest, StatePaths};

fn manager(downloader: FakeDownloader, dest: &std::path::Path, ledger: FetchLedger) -> FetchManager<FakeDownloader> {
    FetchManager::new(downloader, dest, ledger.into_shared())
}

#[tokio::test]
async fn successful_download_is_recorded_and_persisted() {
    let dest = tempdir().unwrap();
    let state = tempdir().unwrap();
    let ledger_path = state.path().join("fetched.json");
    let downloader = FakeDownloader::new().with("https://player.vimeo.com/video/1", Behavior::Write(2048));
    let m = manager(downloader.clone(), dest.path(), FetchLedger::new(&ledger_path));

    let rec = resolution(1, "Tricks/Flips");
    assert_eq!(m.fetch(&rec, false).await, FetchOutcome::Downloaded { bytes: 2048 });

    let job = downloader.calls.lock().unwrap()[0].clone();
    assert_eq!(job.referer, rec.detail_url);
    assert_eq!(job.output, dest.path().join("Tricks/Flips/Trick 1.mp4"));

    let reloaded = FetchLedger::load(&ledger_path).unwrap();
    let entry = reloaded.get(&rec.media_url).unwrap();
    assert_eq!(entry.byte_size, 2048);
    assert_eq!(entry.output_path, rec.output_path);
    assert!(entry.completed_at > 0);
}

#[tokio::test]
async fn ledger_hit_skips_without_invoking_the_downloader() {
    let dest = tempdir().unwrap();
    let state = tempdir().unwrap();
    let rec = resolution(1, "A");
    let mut ledger = FetchLedger::new(state.path().join("fetched.json"));
    ledger
        .record(
            &rec.media_url,
            FetchLedgerEntry::completed_now(&rec.title, &rec.output_path, &rec.detail_url, 10),
        )
        .unwrap();
    let downloader = FakeDownloader::new();
    let m = manager(downloader.clone(), dest.path(), ledger);

    assert_eq!(m.fetch(&rec, false).await, FetchOutcome::Skipped(SkipReason::InLedger));
    assert_eq!(downloader.call_count(), 0);

    // Force ignores the ledger.
    assert!(matches!(m.fetch(&rec, true).await, FetchOutcome::Downloaded { .. }));
    assert_eq!(downloader.call_count(), 1);
}

#[tokio::test]
async fn exit_zero_without_output_is_a_failure() {
    let dest = tempdir().unwrap();
    let state = tempdir().unwrap();
    let ledger_path = state.path().join("fetched.json");
    let downloader = FakeDownloader::new()
        .with("https://player.vimeo.com/video/1", Behavior::NoFile)
        .with("https://player.vimeo.com/video/2", Behavior::EmptyFile);
    let m = manager(downloader, dest.path(), FetchLedger::new(&ledger_path));

    assert!(matches!(m.fetch(&resolution(1, "A"), false).await, FetchOutcome::Failed(_)));
    assert!(matches!(m.fetch(&resolution(2, "A"), false).await, FetchOutcome::Failed(_)));
    assert!(m.ledger().lock().await.is_empty());
    assert!(!ledger_path.exists());
}

#[tokio::test]
async fn tool_failure_carries_its_stderr() {
    let dest = tempdir().unwrap();
    let downloader = FakeDownloader::new().with(
        "https://player.vimeo.com/video/1",
        Behavior::Fail("ERROR: HTTP Error 403: Forbidden".to_string()),
    );
    let m = manager(downloader, dest.path(), FetchLedger::new(dest.path().join("fetched.json")));

    match m.fetch(&resolution(1, "A"), false).await {
        FetchOutcome::Failed(reason) => assert!(reason.contains("403"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn existing_file_without_ledger_entry_is_skipped_not_adopted() {
    let dest = tempdir().unwrap();
    let rec = resolution(1, "A");
    let target = dest.path().join(&rec.output_path);
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, b"already here").unwrap();

    let downloader = FakeDownloader::new();
    let m = manager(downloader.clone(), dest.path(), FetchLedger::new(dest.path().join("fetched.json")));

    assert_eq!(
        m.fetch(&rec, false).await,
        FetchOutcome::Skipped(SkipReason::FileExists { bytes: 12 })
    );
    assert_eq!(downloader.call_count(), 0);
    assert!(!m.ledger().lock().await.contains(&rec.media_url));
}

#[tokio::test]
async fn forced_download_must_produce_a_fresh_file() {
    let dest = tempdir().unwrap();
    let rec = resolution(1, "A");
    let target = dest.path().join(&rec.output_path);
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, b"stale copy from 2019").unwrap();

    // The tool exits 0 without writing, as yt-dlp does when the file is present.
    let downloader = FakeDownloader::new().with(&rec.media_url, Behavior::NoFile);
    let m = manager(downloader.clone(), dest.path(), FetchLedger::new(dest.path().join("fetched.json")));

    assert!(matches!(m.fetch(&rec, true).await, FetchOutcome::Failed(_)));
    assert_eq!(downloader.call_count(), 1);
    assert!(!m.ledger().lock().await.contains(&rec.media_url));
    // The old file is restored and nothing is left beside it.
    assert_eq!(std::fs::read(&target).unwrap(), b"stale copy from 2019");
    assert_eq!(std::fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);
}

#[tokio::test]
async fn forced_download_replaces_the_existing_file() {
    let dest = tempdir().unwrap();
    let rec = resolution(1, "A");
    let target = dest.path().join(&rec.output_path);
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, b"old").unwrap();

    let downloader = FakeDownloader::new().with(&rec.media_url, Behavior::Write(64));
    let m = manager(downloader, dest.path(), FetchLedger::new(dest.path().join("fetched.json")));

    assert_eq!(m.fetch(&rec, true).await, FetchOutcome::Downloaded { bytes: 64 });
    assert_eq!(std::fs::metadata(&target).unwrap().len(), 64);
    assert_eq!(std::fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);
    assert_eq!(m.ledger().lock().await.get(&rec.media_url).unwrap().byte_size, 64);
}

#[tokio::test]
async fn pool_bounds_concurrency_and_serialises_the_ledger() {
    let dest = tempdir().unwrap();
    let state = tempdir().unwrap();
    let ledger_path = state.path().join("fetched.json");
    let downloader = FakeDownloader::new().with_delay(Duration::from_millis(30));
    let m = Arc::new(manager(downloader.clone(), dest.path(), FetchLedger::new(&ledger_path)));
    let records: Vec<_> = (1..=6).map(|n| resolution(n, "Pool")).collect();

    let summary = fetch_all(m, records, 3, false, &StopSignal::new()).await;
    assert_eq!(summary.downloaded, 6);
    assert_eq!(summary.failed, 0);

    let peak = downloader.max_in_flight.load(Ordering::SeqCst);
    assert!((2..=3).contains(&peak), "peak concurrency {peak}");
    assert_eq!(FetchLedger::load(&ledger_path).unwrap().len(), 6);
}

#[tokio::test]
async fn run_fetch_reads_the_resolution_manifest_and_resumes() {
    let dest = tempdir().unwrap();
    let state = tempdir().unwrap();
    let paths = StatePaths::new(state.path());
    let mut resolved = ResolutionManifest::new(paths.extracted());
    for n in 1..=3 {
        resolved.insert(resolution(n, "Run"));
    }
    resolved.save().unwrap();

    let flaky = FakeDownloader::new().with("https://player.vimeo.com/video/2", Behavior::Fail("boom".into()));
    let plan = FetchPlan::new(&paths, dest.path(), 1);
    let first = run_fetch(flaky, &plan, &paths, &StopSignal::new()).await.unwrap();
    assert_eq!((first.downloaded, first.failed), (2, 1));

    let healthy = FakeDownloader::new();
    let second = run_fetch(healthy.clone(), &plan, &paths, &StopSignal::new()).await.unwrap();
    assert_eq!((second.downloaded, second.skipped), (1, 2));
    assert_eq!(healthy.call_count(), 1);
    assert_eq!(FetchLedger::load(paths.fetched()).unwrap().len(), 3);
}

#[tokio::test]
async fn stop_before_start_launches_nothing() {
    let dest = tempdir().unwrap();
    let downloader = FakeDownloader::new();
    let m = Arc::new(manager(downloader.clone(), dest.path(), FetchLedger::new(dest.path().join("fetched.json"))));
    let stop = StopSignal::new();
    stop.request_stop();

    let summary = fetch_all(m, vec![resolution(1, "A"), resolution(2, "A")], 2, false, &stop).await;
    assert_eq!(summary.not_started, 2);
    assert_eq!(downloader.call_count(), 0);
}
