//! YouTube Data API v3 client.

use super::filters::decode_entities;
use super::{VideoDetails, VideoPlatform, VideoStub};
use crate::config::YoutubeSettings;
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// YouTube search and statistics client.
pub struct YoutubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    video_duration: String,
    relevance_language: String,
    region_code: String,
}

impl YoutubeClient {
    /// Create a client from settings. Fails if no API key is configured.
    pub fn with_config(settings: &YoutubeSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            ScoutError::Config(
                "YouTube API key not set. Set youtube.api_key or export YOUTUBE_API_KEY".to_string(),
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            video_duration: settings.video_duration.clone(),
            relevance_language: settings.relevance_language.clone(),
            region_code: settings.region_code.clone(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoutError::VideoSearch(format!(
                "{} returned {}: {}",
                endpoint,
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
    title: String,
    description: String,
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Statistics {
    view_count: Option<String>,
}

#[async_trait]
impl VideoPlatform for YoutubeClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoStub>> {
        let max_results = max_results.clamp(1, 50).to_string();
        let response: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "video"),
                    ("order", "relevance"),
                    ("maxResults", max_results.as_str()),
                    ("videoDuration", self.video_duration.as_str()),
                    ("relevanceLanguage", self.relevance_language.as_str()),
                    ("regionCode", self.region_code.as_str()),
                ],
            )
            .await?;

        let stubs: Vec<VideoStub> = response
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(VideoStub {
                    video_id,
                    title: decode_entities(&item.snippet.title),
                    description: decode_entities(&item.snippet.description),
                    channel: item.snippet.channel_title,
                })
            })
            .collect();

        debug!("Search '{}' returned {} videos", query, stubs.len());
        Ok(stubs)
    }

    #[instrument(skip(self, video_ids), fields(count = video_ids.len()))]
    async fn details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = video_ids.join(",");
        let response: ListResponse<VideoItem> = self
            .get(
                "videos",
                &[("part", "snippet,statistics"), ("id", ids.as_str())],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| VideoDetails {
                video_id: item.id,
                title: decode_entities(&item.snippet.title),
                description: item.snippet.description,
                channel: item.snippet.channel_title,
                view_count: item
                    .statistics
                    .view_count
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn settings_for(server: &Server) -> YoutubeSettings {
        YoutubeSettings {
            api_key: Some("test-key".to_string()),
            base_url: server.url(),
            ..YoutubeSettings::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let settings = YoutubeSettings {
            api_key: Some(String::new()),
            ..YoutubeSettings::default()
        };
        if std::env::var("YOUTUBE_API_KEY").is_err() {
            assert!(YoutubeClient::with_config(&settings).is_err());
        }
    }

    #[tokio::test]
    async fn test_search_parses_items_and_sends_hints() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "photo editor ai tool".into()),
                Matcher::UrlEncoded("type".into(), "video".into()),
                Matcher::UrlEncoded("order".into(), "relevance".into()),
                Matcher::UrlEncoded("maxResults".into(), "5".into()),
                Matcher::UrlEncoded("videoDuration".into(), "medium".into()),
                Matcher::UrlEncoded("key".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "items": [
                    {"id": {"kind": "youtube#video", "videoId": "abcdefghijk"},
                     "snippet": {"title": "Remove.bg AI Background Eraser Demo", "description": "Quick demo", "channelTitle": "Pixel Lab"}},
                    {"id": {"kind": "youtube#channel", "channelId": "UC123"},
                     "snippet": {"title": "A channel", "description": "", "channelTitle": "A channel"}},
                    {"id": {"kind": "youtube#video", "videoId": "bcdefghijkl"},
                     "snippet": {"title": "Photoshop&#39;s Generative Fill", "description": "", "channelTitle": "Adobe"}}
                ]
            }"#,
            )
            .create_async()
            .await;

        let client = YoutubeClient::with_config(&settings_for(&server)).unwrap();
        let stubs = client.search("photo editor ai tool", 5).await.unwrap();

        mock.assert_async().await;
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].video_id, "abcdefghijk");
        assert_eq!(stubs[0].channel, "Pixel Lab");
        assert_eq!(stubs[1].title, "Photoshop's Generative Fill");
    }

    #[tokio::test]
    async fn test_missing_items_is_empty() {
        let mut server = Server::new_async().await;
        let search = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"kind": "youtube#searchListResponse", "pageInfo": {"totalResults": 0}}"#)
            .create_async()
            .await;
        let videos = server
            .mock("GET", "/videos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"kind": "youtube#videoListResponse"}"#)
            .create_async()
            .await;

        let client = YoutubeClient::with_config(&settings_for(&server)).unwrap();

        assert!(client.search("nothing here", 5).await.unwrap().is_empty());
        assert!(client
            .details(&["abcdefghijk".to_string()])
            .await
            .unwrap()
            .is_empty());
        search.assert_async().await;
        videos.assert_async().await;
    }

    #[tokio::test]
    async fn test_details_parses_statistics() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/videos")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "abcdefghijk,bcdefghijkl".into()),
                Matcher::UrlEncoded("part".into(), "snippet,statistics".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "items": [
                    {"id": "abcdefghijk",
                     "snippet": {"title": "Remove.bg demo", "description": "Line one\nLine two", "channelTitle": "Pixel Lab"},
                     "statistics": {"viewCount": "1500", "likeCount": "20"}},
                    {"id": "bcdefghijkl",
                     "snippet": {"title": "Hidden stats", "description": "", "channelTitle": "Adobe"},
                     "statistics": {}}
                ]
            }"#,
            )
            .create_async()
            .await;

        let client = YoutubeClient::with_config(&settings_for(&server)).unwrap();
        let details = client
            .details(&["abcdefghijk".to_string(), "bcdefghijkl".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].view_count, 1500);
        assert_eq!(details[0].description, "Line one\nLine two");
        assert_eq!(details[1].view_count, 0);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"code": 403, "message": "quotaExceeded"}}"#)
            .create_async()
            .await;

        let client = YoutubeClient::with_config(&settings_for(&server)).unwrap();
        let err = client.search("anything", 5).await.unwrap_err();
        assert!(matches!(err, ScoutError::VideoSearch(msg) if msg.contains("403")));
    }

    #[tokio::test]
    async fn test_details_with_no_ids_skips_request() {
        let server = Server::new_async().await;
        let client = YoutubeClient::with_config(&settings_for(&server)).unwrap();
        assert!(client.details(&[]).await.unwrap().is_empty());
    }
}
