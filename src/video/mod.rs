//! Video platform abstraction.
//!
//! Provides a trait-based interface over the video search API plus the
//! heuristic filtering that turns raw search hits into candidates.

mod filters;
mod search;
mod youtube;

pub use filters::{format_view_count, VideoFilter, NO_DESCRIPTION};
pub use search::SearchClient;
pub use youtube::YoutubeClient;

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A search hit before statistics are known.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStub {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel: String,
}

/// Per-video details returned by the statistics lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel: String,
    pub view_count: u64,
}

/// A filtered search hit with statistics, ready for curation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
    /// Cleaned, single-line description.
    pub description: String,
    pub url: String,
    pub channel: String,
    pub view_count: u64,
    /// Human-readable view count, e.g. "1.5K views".
    pub views: String,
}

/// Trait for video search providers.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Search for videos matching a free-text query.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoStub>>;

    /// Look up details and statistics for a batch of video ids.
    async fn details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>>;

    /// Largest id batch accepted by `details`.
    fn max_details_batch(&self) -> usize {
        50
    }
}

static VIDEO_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Matches various YouTube URL formats and bare video IDs
    Regex::new(
        r"(?x)
        (?:
            # Full YouTube URLs
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|v/|shorts/)|youtu\.be/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        # Bare video ID (11 characters)
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex")
});

/// Extract a video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = VIDEO_ID_REGEX.captures(input.trim())?;

    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::error::ScoutError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory platform keyed by exact search query.
    #[derive(Default)]
    pub struct FakePlatform {
        pub results: HashMap<String, Vec<VideoDetails>>,
        pub failing_queries: Vec<String>,
        pub searches: Mutex<Vec<String>>,
        pub detail_batches: Mutex<Vec<Vec<String>>>,
    }

    impl FakePlatform {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_results(mut self, query: &str, videos: Vec<VideoDetails>) -> Self {
            self.results.insert(query.to_string(), videos);
            self
        }

        pub fn failing(mut self, query: &str) -> Self {
            self.failing_queries.push(query.to_string());
            self
        }

        pub fn searches(&self) -> Vec<String> {
            self.searches.lock().unwrap().clone()
        }

        pub fn detail_batches(&self) -> Vec<Vec<String>> {
            self.detail_batches.lock().unwrap().clone()
        }

        fn all_videos(&self) -> impl Iterator<Item = &VideoDetails> {
            self.results.values().flatten()
        }
    }

    pub fn video(id: &str, title: &str, description: &str, views: u64) -> VideoDetails {
        VideoDetails {
            video_id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            channel: "Demo Channel".to_string(),
            view_count: views,
        }
    }

    #[async_trait]
    impl VideoPlatform for FakePlatform {
        async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoStub>> {
            self.searches.lock().unwrap().push(query.to_string());
            if self.failing_queries.iter().any(|q| q == query) {
                return Err(ScoutError::VideoSearch("quotaExceeded".to_string()));
            }
            Ok(self
                .results
                .get(query)
                .map(|videos| {
                    videos
                        .iter()
                        .take(max_results as usize)
                        .map(|v| VideoStub {
                            video_id: v.video_id.clone(),
                            title: v.title.clone(),
                            description: v.description.clone(),
                            channel: v.channel.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>> {
            self.detail_batches.lock().unwrap().push(video_ids.to_vec());
            Ok(video_ids
                .iter()
                .filter_map(|id| self.all_videos().find(|v| &v.video_id == id).cloned())
                .collect())
        }
    }
}
