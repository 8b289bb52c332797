//! Shared fixtures for the stage integration tests.

#![allow(dead_code)]

pub mod fake_site;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vmirror_core::config::{MirrorConfig, RetryConfig, WaitConfig};
use vmirror_core::fetch::{DownloadError, DownloadJob, Downloader};
use vmirror_core::manifest::ResolutionRecord;

/// Defaults with short waits and immediate retries, pointed at the fake site.
pub fn test_config() -> MirrorConfig {
    let mut cfg = MirrorConfig::default();
    cfg.site.base_url = fake_site::BASE_URL.to_string();
    cfg.site.login_url = fake_site::LOGIN_URL.to_string();
    cfg.waits = WaitConfig {
        timeout_secs: 0.2,
        title_timeout_secs: 0.02,
        poll_ms: 1,
        settle_ms: 0,
    };
    cfg.retry = Some(RetryConfig {
        max_attempts: 3,
        base_delay_secs: 0.0,
        max_delay_secs: 0,
    });
    cfg
}

pub fn resolution(n: u32, section: &str) -> ResolutionRecord {
    ResolutionRecord {
        title: format!("Trick {n}"),
        detail_url: format!("https://site.test/trick/{n}"),
        media_url: format!("https://player.vimeo.com/video/{n}"),
        output_path: format!("{section}/Trick {n}.mp4"),
    }
}

/// What the fake downloader does for one media URL.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Exit 0 after writing this many bytes.
    Write(usize),
    /// Exit 0 without writing anything.
    NoFile,
    /// Exit 0 after creating an empty file.
    EmptyFile,
    /// Non-zero exit with this stderr tail.
    Fail(String),
}

/// Records every job and acts per media URL (`Write(16)` when unlisted).
#[derive(Clone, Default)]
pub struct FakeDownloader {
    behaviors: HashMap<String, Behavior>,
    delay: Duration,
    pub calls: Arc<Mutex<Vec<DownloadJob>>>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, media_url: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(media_url.to_string(), behavior);
        self
    }

    /// Each download takes at least `delay`, so workers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, job: &DownloadJob) -> Result<(), DownloadError> {
        self.calls.lock().unwrap().push(job.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.behaviors.get(&job.media_url).cloned().unwrap_or(Behavior::Write(16)) {
            Behavior::Write(n) => {
                std::fs::write(&job.output, vec![b'v'; n]).unwrap();
                Ok(())
            }
            Behavior::NoFile => Ok(()),
            Behavior::EmptyFile => {
                std::fs::write(&job.output, b"").unwrap();
                Ok(())
            }
            Behavior::Fail(stderr) => Err(DownloadError::Exit {
                program: "fake-dl".to_string(),
                status: "exit status: 1".to_string(),
                stderr,
            }),
        }
    }
}
