use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters for transient browser conditions (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per browser operation (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.2 = 200ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.2,
            max_delay_secs: 2,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Where the session starts and how a successful login is recognised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL used to absolutise relative card links.
    pub base_url: String,
    pub login_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.kojostricklab.com/".to_string(),
            login_url: "https://www.kojostricklab.com/login".to_string(),
        }
    }
}

/// CSS selectors describing the remote page structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub login_email: String,
    pub login_password: String,
    pub login_submit: String,
    /// Element that only exists once the session is authenticated.
    pub post_login_marker: String,
    /// Top-level entries of the catalogue menu.
    pub menu_items: String,
    /// Nested entries, relative to a menu entry.
    pub menu_children: String,
    /// Label element, relative to a menu entry. Falls back to the entry text.
    pub menu_label: String,
    /// Grid container; the last match on the page is the live one.
    pub content_container: String,
    /// One item card, relative to the container.
    pub card: String,
    pub card_link: String,
    pub card_title: String,
    /// Busy indicator shown while the next page of cards loads.
    pub spinner: String,
    /// Element scrolled into view to trigger incremental loading.
    pub load_trigger: String,
    /// Embedded player frame on a detail page.
    pub media_frame: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            login_email: "input[name='email']".to_string(),
            login_password: "input[name='password']".to_string(),
            login_submit: "form button[type='submit']".to_string(),
            post_login_marker: "#menu".to_string(),
            menu_items: "nav#menu > ul > li".to_string(),
            menu_children: ":scope > ul > li".to_string(),
            menu_label: ":scope > a".to_string(),
            content_container: "div.content-container".to_string(),
            card: "div.col-xl-2dot4".to_string(),
            card_link: "a".to_string(),
            card_title: ".trick-name".to_string(),
            spinner: "div.main-spinner.auto.spinner-small".to_string(),
            load_trigger: "#bottom-footer".to_string(),
            media_frame: "iframe".to_string(),
        }
    }
}

/// Bounds for every wait on remote state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Upper bound for a single wait (element present, spinner cleared, login marker).
    pub timeout_secs: f64,
    /// Upper bound when waiting for a card title to render.
    pub title_timeout_secs: f64,
    /// Polling interval while waiting.
    pub poll_ms: u64,
    /// Pause after each load trigger so new content can start arriving.
    pub settle_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10.0,
            title_timeout_secs: 5.0,
            poll_ms: 250,
            settle_ms: 2000,
        }
    }
}

impl WaitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs.max(0.0))
    }

    pub fn title_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.title_timeout_secs.max(0.0))
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Consecutive load triggers without new cards before a section counts as exhausted.
    pub max_failed_attempts: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Substring a frame source must contain to count as a playable media reference.
    pub provider_signature: String,
    /// Extension appended to the sanitized title when building output paths.
    pub extension: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_signature: "vimeo.com".to_string(),
            extension: ".mp4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// External downloader executable, looked up on PATH unless it contains a separator.
    pub downloader: String,
    /// Extra arguments placed before the standard referer/output/url arguments.
    pub extra_args: Vec<String>,
    /// Number of downloads run concurrently.
    pub workers: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            downloader: "yt-dlp".to_string(),
            extra_args: Vec::new(),
            workers: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Chrome/Chromium binary; autodetected when unset.
    pub executable: Option<PathBuf>,
    /// Additional command-line flags for the browser process.
    pub extra_args: Vec<String>,
}

/// Global configuration loaded from `~/.config/vmirror/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub selectors: Selectors,
    #[serde(default)]
    pub waits: WaitConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl MirrorConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vmirror")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MirrorConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MirrorConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MirrorConfig = toml::from_str(&data)?;
    Ok(cfg)
}
