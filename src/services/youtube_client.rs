use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CLIENT_ORIGIN: &str = "http://localhost:3000";
const CLIENT_AGENT: &str = "Tenzzen/1.0";

/// Parameters for a `search` call restricted to videos.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoSearchQuery {
    pub q: String,
    pub max_results: u32,
    pub channel_id: Option<String>,
    /// YouTube `videoDuration` bucket: `short`, `medium` or `long`.
    pub duration: Option<&'static str>,
    /// Ask for HD results in relevance order.
    pub high_quality: bool,
}

impl VideoSearchQuery {
    pub fn new(q: impl Into<String>, max_results: u32) -> Self {
        Self {
            q: q.into(),
            max_results,
            ..Self::default()
        }
    }

    pub fn high_quality(mut self) -> Self {
        self.high_quality = true;
        self
    }

    pub fn with_duration(mut self, duration: Option<&'static str>) -> Self {
        self.duration = duration;
        self
    }

    pub fn in_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("q", self.q.clone()),
            ("maxResults", self.max_results.to_string()),
            ("relevanceLanguage", "en".to_string()),
            ("videoEmbeddable", "true".to_string()),
        ];
        if self.high_quality {
            params.push(("order", "relevance".to_string()));
            params.push(("videoDefinition", "high".to_string()));
        }
        if let Some(duration) = self.duration {
            params.push(("videoDuration", duration.to_string()));
        }
        if let Some(channel_id) = &self.channel_id {
            params.push(("channelId", channel_id.clone()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: SearchItemId,
    #[serde(default)]
    pub snippet: Snippet,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snippet {
    pub title: Option<String>,
    pub channel_title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

impl Thumbnails {
    /// Highest available resolution, or an empty string.
    pub fn best_url(&self) -> String {
        [&self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|thumbnail| thumbnail.url.as_str())
            .find(|url| !url.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoItem {
    pub id: String,
    pub snippet: Snippet,
    pub content_details: ContentDetails,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub view_count: Option<String>,
}

impl VideoItem {
    /// Stand-in details built from a search hit when the `videos` call fails.
    pub fn from_search_item(item: &SearchItem) -> Option<Self> {
        Some(Self {
            id: item.id.video_id.clone()?,
            snippet: item.snippet.clone(),
            content_details: ContentDetails {
                duration: Some("PT0M0S".to_string()),
            },
            statistics: Statistics {
                view_count: Some("0".to_string()),
            },
        })
    }
}

/// Read access to the YouTube video catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    async fn search_videos(&self, query: &VideoSearchQuery) -> AppResult<Vec<SearchItem>>;

    async fn find_channel_id(&self, channel_name: &str) -> AppResult<Option<String>>;

    async fn video_details(&self, video_ids: &[String]) -> AppResult<Vec<VideoItem>>;
}

pub struct YoutubeApiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<SecretString>,
}

impl YoutubeApiClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(CLIENT_ORIGIN));
        headers.insert(ORIGIN, HeaderValue::from_static(CLIENT_ORIGIN));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_AGENT));

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_base: config.youtube_api_base.trim_end_matches('/').to_string(),
            api_key: config.youtube_api_key.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> AppResult<T> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AppError::NotConfigured("YOUTUBE_API_KEY is not set".to_string()))?;

        log::info!("YouTube API request: {}", endpoint);
        let response = self
            .http
            .get(format!("{}/{}", self.api_base, endpoint))
            .query(params)
            .query(&[("key", key.expose_secret())])
            .send()
            .await?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        if status.is_success() && is_json {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = describe_failure(status.as_u16(), &body);
        log::warn!("{}", message);
        Err(AppError::ExternalService(message))
    }
}

#[async_trait]
impl VideoCatalog for YoutubeApiClient {
    async fn search_videos(&self, query: &VideoSearchQuery) -> AppResult<Vec<SearchItem>> {
        let response: ListResponse<SearchItem> = self.get("search", &query.params()).await?;
        Ok(response.items)
    }

    async fn find_channel_id(&self, channel_name: &str) -> AppResult<Option<String>> {
        let params = [
            ("part", "snippet".to_string()),
            ("type", "channel".to_string()),
            ("q", channel_name.to_string()),
            ("maxResults", "1".to_string()),
        ];
        let response: ListResponse<SearchItem> = self.get("search", &params).await?;
        Ok(response
            .items
            .into_iter()
            .find_map(|item| item.id.channel_id))
    }

    async fn video_details(&self, video_ids: &[String]) -> AppResult<Vec<VideoItem>> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = [
            ("part", "contentDetails,statistics,snippet".to_string()),
            ("id", video_ids.join(",")),
        ];
        let response: ListResponse<VideoItem> = self.get("videos", &params).await?;
        Ok(response.items)
    }
}

/// Human-readable reason for a failed catalog call. HTML bodies usually mean
/// the key was rejected before the API saw the request.
fn describe_failure(status: u16, body: &str) -> String {
    let mut message = format!("YouTube API request failed with status {}", status);
    let trimmed = body.trim_start();
    if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") {
        message.push_str(". Received HTML instead of JSON, which usually indicates an API key issue.");
        let lowered = body.to_lowercase();
        if body.contains("API key not valid") {
            message.push_str(" API key is invalid.");
        } else if lowered.contains("referer") && lowered.contains("blocked") {
            message.push_str(" Requests from this referer are blocked.");
        } else if lowered.contains("quota") {
            message.push_str(" API quota exceeded.");
        }
    }
    message
}
