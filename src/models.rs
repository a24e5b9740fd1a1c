use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// One memoized upstream result. The entry is only meaningful while
/// `SystemTime::now() < expires_at`; readers treat anything else as absent.
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub expires_at: SystemTime,
}

/// Process-wide mutable state: the upstream response cache and the
/// per-client sliding window of contact submission timestamps.
/// Lives for the process lifetime, nothing is persisted.
pub struct AppState {
    pub cache: HashMap<String, CacheEntry>,
    pub rate_limits: HashMap<String, Vec<SystemTime>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            rate_limits: HashMap::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub subscribers: u64,
    pub total_views: u64,
    pub total_videos: u64,
    pub channel_title: String,
    pub thumbnail: String,
}

/// An empty `video_id` means "no video found"; `error` is only set when the
/// upstream could not be reached at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVideo {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub published_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideo {
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    pub published_at: String,
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub count: u64,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}
