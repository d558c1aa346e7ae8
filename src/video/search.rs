//! Keyword search with filtering and batched statistics lookup.

use super::{format_view_count, watch_url, VideoCandidate, VideoDetails, VideoFilter, VideoPlatform};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Turns one keyword into filtered, statistics-enriched candidates.
pub struct SearchClient {
    platform: Arc<dyn VideoPlatform>,
    filter: VideoFilter,
    details_batch_size: usize,
    batch_delay: Duration,
}

impl SearchClient {
    pub fn new(platform: Arc<dyn VideoPlatform>, filter: VideoFilter) -> Self {
        let details_batch_size = platform.max_details_batch();
        Self {
            platform,
            filter,
            details_batch_size,
            batch_delay: Duration::from_millis(500),
        }
    }

    /// Set the number of ids per statistics lookup (bounded by the platform).
    pub fn with_details_batch_size(mut self, size: usize) -> Self {
        self.details_batch_size = size.clamp(1, self.platform.max_details_batch());
        self
    }

    /// Set the delay between statistics batches.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Search for `"<keyword> ai tool"` and return candidates.
    ///
    /// Provider failures are logged and yield an empty list.
    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str, max_results: u32) -> Vec<VideoCandidate> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Vec::new();
        }

        let query = format!("{} ai tool", keyword);
        let stubs = match self.platform.search(&query, max_results).await {
            Ok(stubs) => stubs,
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                return Vec::new();
            }
        };

        let total = stubs.len();
        let ids: Vec<String> = stubs
            .into_iter()
            .filter(|s| self.filter.accepts(&s.title, &s.description))
            .map(|s| s.video_id)
            .collect();

        debug!("'{}': {} of {} results passed filters", query, ids.len(), total);

        if ids.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::with_capacity(ids.len());
        for (i, batch) in ids.chunks(self.details_batch_size).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            match self.platform.details(batch).await {
                Ok(details) => {
                    candidates.extend(details.into_iter().map(|d| self.to_candidate(d)));
                }
                Err(e) => {
                    warn!("Details lookup for {} videos failed: {}", batch.len(), e);
                }
            }
        }

        candidates
    }

    fn to_candidate(&self, details: VideoDetails) -> VideoCandidate {
        VideoCandidate {
            url: watch_url(&details.video_id),
            description: self.filter.clean_description(&details.description),
            views: format_view_count(details.view_count),
            video_id: details.video_id,
            title: details.title,
            channel: details.channel,
            view_count: details.view_count,
        }
    }
}
