use serde::{Deserialize, Serialize};

use super::{ManifestRecord, VideoRecord};
use crate::url_model;

/// A detail page whose embedded media reference was found (`extracted.json` entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub title: String,
    #[serde(alias = "embed_page_url")]
    pub detail_url: String,
    #[serde(alias = "vimeo_url")]
    pub media_url: String,
    /// Relative to the fetch destination; already sanitized.
    pub output_path: String,
}

impl ResolutionRecord {
    /// Builds the record for `video` resolved to `media_url`, deriving the output path.
    pub fn for_video(video: &VideoRecord, media_url: String, extension: &str) -> Self {
        Self {
            title: video.title.clone(),
            detail_url: video.detail_url.clone(),
            media_url,
            output_path: url_model::output_path(&video.path, &video.title, extension),
        }
    }
}

impl ManifestRecord for ResolutionRecord {
    fn key(&self) -> &str {
        &self.detail_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_video_derives_sanitized_output_path() {
        let video = VideoRecord {
            title: "Wall Spin: Part 2?".to_string(),
            detail_url: "https://x/v/9".to_string(),
            path: "Tricks > Spins".to_string(),
        };
        let rec = ResolutionRecord::for_video(&video, "https://player.vimeo.com/video/1".into(), ".mp4");
        assert_eq!(rec.output_path, "Tricks/Spins/Wall Spin Part 2.mp4");
        assert_eq!(rec.detail_url, video.detail_url);
    }

    #[test]
    fn legacy_entries_load() {
        let json = r#"{
            "title": "Kong Vault",
            "embed_page_url": "https://x/v/1",
            "vimeo_url": "https://player.vimeo.com/video/42",
            "output_path": "Vaults/Kong Vault.mp4"
        }"#;
        let rec: ResolutionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.detail_url, "https://x/v/1");
        assert_eq!(rec.media_url, "https://player.vimeo.com/video/42");
    }
}
