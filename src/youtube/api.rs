use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::{
    Config, PLAYLISTS_PAGE_SIZE, PLAYLIST_PAGE_SIZE, REQUEST_TIMEOUT_SECS, YOUTUBE_API_BASE,
};
use crate::models::{ChannelStats, LatestVideo, PlaylistSummary, PlaylistVideo};

#[derive(Debug)]
pub enum UpstreamError {
    Http(String),
    Status(u16),
    MissingData(&'static str),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "upstream request failed: {}", e),
            Self::Status(code) => write!(f, "upstream returned status {}", code),
            Self::MissingData(what) => write!(f, "upstream response missing {}", what),
        }
    }
}

/// Read-only view of the video-hosting API. `VideoService` is written against
/// this trait so tests can count and script upstream calls.
#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn channel_overview(&self) -> Result<ChannelStats, UpstreamError>;
    /// Most recent upload, or `None` when the channel has no matching upload.
    /// `published_after` constrains the lookup to a trailing recency window.
    async fn latest_upload(
        &self,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Option<LatestVideo>, UpstreamError>;
    async fn playlist_videos(&self, playlist_id: &str) -> Result<Vec<PlaylistVideo>, UpstreamError>;
    async fn playlists(&self) -> Result<Vec<PlaylistSummary>, UpstreamError>;
    async fn recent_uploads(&self, max_results: u32) -> Result<Vec<PlaylistVideo>, UpstreamError>;
}

/// YouTube Data API v3 client. Channel identity comes from config, either a
/// fixed channel id or a handle resolved on demand.
pub struct YouTubeApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    channel_id: Option<String>,
    channel_handle: Option<String>,
}

impl YouTubeApi {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: YOUTUBE_API_BASE.to_string(),
            api_key: config.youtube_api_key.clone(),
            channel_id: config.channel_id.clone(),
            channel_handle: config.channel_handle.clone(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/{}", self.base_url, resource);
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| UpstreamError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Http(e.to_string()))
    }

    /// Fixed id when configured, otherwise one lookup by handle.
    async fn resolve_channel_id(&self) -> Result<String, UpstreamError> {
        if let Some(id) = &self.channel_id {
            return Ok(id.clone());
        }
        let handle = self
            .channel_handle
            .as_deref()
            .ok_or(UpstreamError::MissingData("channel identity"))?;
        let listing: ChannelListResponse = self
            .get("channels", &[("part", "id"), ("forHandle", handle)])
            .await?;
        listing
            .items
            .into_iter()
            .next()
            .and_then(|item| item.id)
            .ok_or(UpstreamError::MissingData("channel id for handle"))
    }

    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<String, UpstreamError> {
        let listing: ChannelListResponse = self
            .get("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;
        listing
            .items
            .into_iter()
            .next()
            .and_then(|item| item.content_details)
            .and_then(|details| details.related_playlists)
            .and_then(|playlists| playlists.uploads)
            .ok_or(UpstreamError::MissingData("uploads playlist"))
    }

    async fn search_uploads(
        &self,
        channel_id: &str,
        max_results: u32,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<PlaylistVideo>, UpstreamError> {
        let max = max_results.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("channelId", channel_id),
            ("order", "date"),
            ("type", "video"),
            ("maxResults", max.as_str()),
        ];
        let after = published_after.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
        if let Some(after) = &after {
            params.push(("publishedAfter", after.as_str()));
        }

        let listing: SearchListResponse = self.get("search", &params).await?;
        let videos = listing
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.and_then(|id| id.video_id)?;
                let snippet = item.snippet.unwrap_or_default();
                Some(PlaylistVideo {
                    video_id,
                    title: snippet.title.unwrap_or_default(),
                    thumbnail: snippet.thumbnails.unwrap_or_default().best_url(),
                    published_at: snippet.published_at.unwrap_or_default(),
                    position: 0,
                })
            })
            .enumerate()
            .map(|(i, mut video)| {
                video.position = i as u32;
                video
            })
            .collect();
        Ok(videos)
    }
}

#[async_trait]
impl VideoApi for YouTubeApi {
    async fn channel_overview(&self) -> Result<ChannelStats, UpstreamError> {
        let channel_id = self.resolve_channel_id().await?;
        let listing: ChannelListResponse = self
            .get(
                "channels",
                &[("part", "statistics,snippet"), ("id", channel_id.as_str())],
            )
            .await?;
        let channel = listing
            .items
            .into_iter()
            .next()
            .ok_or(UpstreamError::MissingData("channel"))?;

        let statistics = channel.statistics.unwrap_or_default();
        let snippet = channel.snippet.unwrap_or_default();
        Ok(ChannelStats {
            subscribers: parse_count(statistics.subscriber_count),
            total_views: parse_count(statistics.view_count),
            total_videos: parse_count(statistics.video_count),
            channel_title: snippet.title.unwrap_or_default(),
            thumbnail: snippet.thumbnails.unwrap_or_default().best_url(),
        })
    }

    async fn latest_upload(
        &self,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Option<LatestVideo>, UpstreamError> {
        let channel_id = self.resolve_channel_id().await?;

        // The windowed variant needs the search endpoint; the default path
        // reads the head of the uploads playlist, which costs less quota.
        if published_after.is_some() {
            let found = self
                .search_uploads(&channel_id, 1, published_after)
                .await?
                .into_iter()
                .next();
            return Ok(found.map(|video| LatestVideo {
                video_id: video.video_id,
                title: video.title,
                description: String::new(),
                thumbnail: video.thumbnail,
                published_at: video.published_at,
                error: None,
            }));
        }

        let uploads_id = self.uploads_playlist_id(&channel_id).await?;
        let listing: PlaylistItemListResponse = self
            .get(
                "playlistItems",
                &[
                    ("part", "snippet"),
                    ("playlistId", uploads_id.as_str()),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        let item = match listing.items.into_iter().next() {
            Some(item) => item,
            None => return Ok(None),
        };
        let snippet = item.snippet.unwrap_or_default();
        let video_id = snippet
            .resource_id
            .and_then(|r| r.video_id)
            .ok_or(UpstreamError::MissingData("video id"))?;
        Ok(Some(LatestVideo {
            video_id,
            title: snippet.title.unwrap_or_default(),
            description: snippet.description.unwrap_or_default(),
            thumbnail: snippet.thumbnails.unwrap_or_default().best_url(),
            published_at: snippet.published_at.unwrap_or_default(),
            error: None,
        }))
    }

    async fn playlist_videos(&self, playlist_id: &str) -> Result<Vec<PlaylistVideo>, UpstreamError> {
        let max = PLAYLIST_PAGE_SIZE.to_string();
        let listing: PlaylistItemListResponse = self
            .get(
                "playlistItems",
                &[
                    ("part", "snippet"),
                    ("playlistId", playlist_id),
                    ("maxResults", max.as_str()),
                ],
            )
            .await?;

        let videos = listing
            .items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let snippet = item.snippet?;
                let video_id = snippet.resource_id.as_ref()?.video_id.clone()?;
                Some(PlaylistVideo {
                    video_id,
                    title: snippet.title.unwrap_or_default(),
                    thumbnail: snippet.thumbnails.unwrap_or_default().best_url(),
                    published_at: snippet.published_at.unwrap_or_default(),
                    position: snippet.position.unwrap_or(i as u32),
                })
            })
            .collect();
        Ok(videos)
    }

    async fn playlists(&self) -> Result<Vec<PlaylistSummary>, UpstreamError> {
        let channel_id = self.resolve_channel_id().await?;
        let max = PLAYLISTS_PAGE_SIZE.to_string();
        let listing: PlaylistListResponse = self
            .get(
                "playlists",
                &[
                    ("part", "snippet,contentDetails"),
                    ("channelId", channel_id.as_str()),
                    ("maxResults", max.as_str()),
                ],
            )
            .await?;

        let playlists = listing
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.id?;
                let snippet = item.snippet.unwrap_or_default();
                Some(PlaylistSummary {
                    id,
                    title: snippet.title.unwrap_or_default(),
                    thumbnail: snippet.thumbnails.unwrap_or_default().best_url(),
                    count: item
                        .content_details
                        .and_then(|details| details.item_count)
                        .unwrap_or(0),
                    description: snippet.description.unwrap_or_default(),
                })
            })
            .collect();
        Ok(playlists)
    }

    async fn recent_uploads(&self, max_results: u32) -> Result<Vec<PlaylistVideo>, UpstreamError> {
        let channel_id = self.resolve_channel_id().await?;
        self.search_uploads(&channel_id, max_results, None).await
    }
}

/// Counts arrive as decimal strings; anything unparsable normalizes to 0.
fn parse_count(raw: Option<String>) -> u64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

// Wire shapes. Every field is optional so a partial upstream response
// degrades to defaults instead of a parse failure.

#[derive(Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Deserialize)]
struct ChannelItem {
    id: Option<String>,
    statistics: Option<ChannelStatistics>,
    snippet: Option<Snippet>,
    #[serde(rename = "contentDetails")]
    content_details: Option<ChannelContentDetails>,
}

#[derive(Default, Deserialize)]
struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    subscriber_count: Option<String>,
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    #[serde(rename = "videoCount")]
    video_count: Option<String>,
}

#[derive(Deserialize)]
struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists")]
    related_playlists: Option<RelatedPlaylists>,
}

#[derive(Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    snippet: Option<Snippet>,
}

#[derive(Deserialize)]
struct PlaylistListResponse {
    #[serde(default)]
    items: Vec<PlaylistEntry>,
}

#[derive(Deserialize)]
struct PlaylistEntry {
    id: Option<String>,
    snippet: Option<Snippet>,
    #[serde(rename = "contentDetails")]
    content_details: Option<PlaylistContentDetails>,
}

#[derive(Deserialize)]
struct PlaylistContentDetails {
    #[serde(rename = "itemCount")]
    item_count: Option<u64>,
}

#[derive(Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: Option<SearchId>,
    snippet: Option<Snippet>,
}

#[derive(Deserialize)]
struct SearchId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Default, Deserialize)]
struct Snippet {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    thumbnails: Option<Thumbnails>,
    #[serde(rename = "resourceId")]
    resource_id: Option<ResourceId>,
    position: Option<u32>,
}

#[derive(Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best_url(self) -> String {
        self.high
            .or(self.medium)
            .or(self.default)
            .map(|t| t.url)
            .unwrap_or_default()
    }
}
