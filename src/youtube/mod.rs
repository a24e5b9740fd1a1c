use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::config::{Config, CACHE_TTL_SECS, RECENT_UPLOADS_COUNT};
use crate::models::{AppState, ChannelStats, LatestVideo, PlaylistSummary, PlaylistVideo};
use crate::services::{cache_get, cache_put};

pub mod api;

pub use api::{UpstreamError, VideoApi, YouTubeApi};

pub const KEY_CHANNEL_STATS: &str = "channelStats";
pub const KEY_LATEST_VIDEO: &str = "latestVideo";
pub const KEY_PLAYLISTS: &str = "playlists";
pub const KEY_RECENT_UPLOADS: &str = "recentUploads";

pub fn playlist_cache_key(playlist_id: &str) -> String {
    format!("playlist_{}", playlist_id)
}

/// Cache-backed proxy in front of the video-hosting API. Fresh cache hits
/// never touch the upstream; misses trigger exactly one fetch whose result
/// overwrites the entry. Upstream failures are absorbed here and replaced
/// with documented defaults, so the stats/latest/playlist operations never
/// surface an error to their callers.
pub struct VideoService<A: VideoApi> {
    api: A,
    state: Arc<RwLock<AppState>>,
    ttl_secs: u64,
    latest_window_days: Option<i64>,
}

impl<A: VideoApi> VideoService<A> {
    pub fn new(api: A, state: Arc<RwLock<AppState>>, config: &Config) -> Self {
        Self {
            api,
            state,
            ttl_secs: CACHE_TTL_SECS,
            latest_window_days: config.latest_window_days,
        }
    }

    pub async fn channel_stats(&self) -> ChannelStats {
        if let Some(hit) = cache_get(&self.state, KEY_CHANNEL_STATS).await {
            return hit;
        }
        match self.api.channel_overview().await {
            Ok(stats) => {
                cache_put(&self.state, KEY_CHANNEL_STATS, &stats, self.ttl_secs).await;
                stats
            }
            Err(e) => {
                log::warn!("channel stats unavailable: {}", e);
                ChannelStats::default()
            }
        }
    }

    pub async fn latest_video(&self) -> LatestVideo {
        if let Some(hit) = cache_get(&self.state, KEY_LATEST_VIDEO).await {
            return hit;
        }
        let published_after = self
            .latest_window_days
            .map(|days| Utc::now() - Duration::days(days));
        match self.api.latest_upload(published_after).await {
            Ok(Some(video)) => {
                cache_put(&self.state, KEY_LATEST_VIDEO, &video, self.ttl_secs).await;
                video
            }
            // No upload matched; an empty videoId tells the frontend "none
            // found". Not cached, so a new upload shows up promptly.
            Ok(None) => LatestVideo::default(),
            Err(e) => {
                log::warn!("latest video unavailable: {}", e);
                LatestVideo {
                    error: Some("upstream unavailable".to_string()),
                    ..LatestVideo::default()
                }
            }
        }
    }

    pub async fn playlist_videos(&self, playlist_id: &str) -> Vec<PlaylistVideo> {
        let key = playlist_cache_key(playlist_id);
        if let Some(hit) = cache_get(&self.state, &key).await {
            return hit;
        }
        match self.api.playlist_videos(playlist_id).await {
            Ok(videos) => {
                cache_put(&self.state, &key, &videos, self.ttl_secs).await;
                videos
            }
            Err(e) => {
                log::warn!("playlist {} unavailable: {}", playlist_id, e);
                Vec::new()
            }
        }
    }

    /// Unlike the other operations this one propagates upstream failure;
    /// the route maps it to a 500 instead of serving an empty default.
    pub async fn playlists(&self) -> Result<Vec<PlaylistSummary>, UpstreamError> {
        if let Some(hit) = cache_get(&self.state, KEY_PLAYLISTS).await {
            return Ok(hit);
        }
        let playlists = self.api.playlists().await?;
        cache_put(&self.state, KEY_PLAYLISTS, &playlists, self.ttl_secs).await;
        Ok(playlists)
    }

    pub async fn recent_uploads(&self) -> Result<Vec<PlaylistVideo>, UpstreamError> {
        if let Some(hit) = cache_get(&self.state, KEY_RECENT_UPLOADS).await {
            return Ok(hit);
        }
        let uploads = self.api.recent_uploads(RECENT_UPLOADS_COUNT).await?;
        cache_put(&self.state, KEY_RECENT_UPLOADS, &uploads, self.ttl_secs).await;
        Ok(uploads)
    }
}
