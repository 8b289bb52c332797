use serde::{Deserialize, Serialize};

use super::ManifestRecord;

/// Title recorded when a card shows no readable title.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

fn unknown_title() -> String {
    UNKNOWN_TITLE.to_string()
}

/// One discovered catalogue item (`crawled.json` entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(default = "unknown_title")]
    pub title: String,
    /// Detail page of the item; unique across the manifest.
    #[serde(alias = "url")]
    pub detail_url: String,
    /// Breadcrumb labels joined with `/`.
    #[serde(default)]
    pub path: String,
}

impl ManifestRecord for VideoRecord {
    fn key(&self) -> &str {
        &self.detail_url
    }
}
