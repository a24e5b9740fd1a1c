use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::RwLock;

use crate::config::{RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW_SECS};
use crate::models::{AppState, CacheEntry, ChannelStats};
use crate::services::{cache_get, cache_put, check_rate_limit};

fn new_state() -> Arc<RwLock<AppState>> {
    Arc::new(RwLock::new(AppState::new()))
}

fn sample_stats() -> ChannelStats {
    ChannelStats {
        subscribers: 12345,
        total_views: 1_000_000,
        total_videos: 42,
        channel_title: "Test Channel".to_string(),
        thumbnail: "https://example.com/thumb.jpg".to_string(),
    }
}

#[tokio::test]
async fn cache_roundtrip_returns_equal_value() {
    let state = new_state();
    let stats = sample_stats();

    cache_put(&state, "channelStats", &stats, 600).await;
    let cached: Option<ChannelStats> = cache_get(&state, "channelStats").await;
    assert_eq!(cached, Some(stats));
}

#[tokio::test]
async fn cache_miss_on_unknown_key() {
    let state = new_state();
    let cached: Option<ChannelStats> = cache_get(&state, "nothing-here").await;
    assert!(cached.is_none());
}

#[tokio::test]
async fn expired_entry_is_logically_absent() {
    let state = new_state();
    {
        let mut state = state.write().await;
        state.cache.insert(
            "channelStats".to_string(),
            CacheEntry {
                value: serde_json::to_value(sample_stats()).unwrap(),
                expires_at: SystemTime::now() - Duration::from_secs(1),
            },
        );
    }
    let cached: Option<ChannelStats> = cache_get(&state, "channelStats").await;
    assert!(cached.is_none());
}

#[tokio::test]
async fn put_overwrites_stale_entry() {
    let state = new_state();
    let mut stats = sample_stats();
    cache_put(&state, "channelStats", &stats, 600).await;

    // Age the entry out, then store a fresh value under the same key.
    {
        let mut state = state.write().await;
        let entry = state.cache.get_mut("channelStats").unwrap();
        entry.expires_at = SystemTime::now() - Duration::from_secs(1);
    }
    stats.subscribers = 99999;
    cache_put(&state, "channelStats", &stats, 600).await;

    let cached: Option<ChannelStats> = cache_get(&state, "channelStats").await;
    assert_eq!(cached.unwrap().subscribers, 99999);
}

#[tokio::test]
async fn rate_limit_allows_quota_then_rejects() {
    let state = new_state();
    for _ in 0..RATE_LIMIT_MAX_REQUESTS {
        assert!(check_rate_limit(&state, "203.0.113.7").await);
    }
    assert!(!check_rate_limit(&state, "203.0.113.7").await);
}

#[tokio::test]
async fn rejected_attempt_is_not_recorded() {
    let state = new_state();
    for _ in 0..RATE_LIMIT_MAX_REQUESTS {
        assert!(check_rate_limit(&state, "203.0.113.7").await);
    }
    assert!(!check_rate_limit(&state, "203.0.113.7").await);

    let state = state.read().await;
    assert_eq!(
        state.rate_limits.get("203.0.113.7").unwrap().len(),
        RATE_LIMIT_MAX_REQUESTS
    );
}

#[tokio::test]
async fn clients_are_limited_independently() {
    let state = new_state();
    for _ in 0..RATE_LIMIT_MAX_REQUESTS {
        assert!(check_rate_limit(&state, "203.0.113.7").await);
    }
    assert!(!check_rate_limit(&state, "203.0.113.7").await);
    assert!(check_rate_limit(&state, "198.51.100.4").await);
}

#[tokio::test]
async fn aged_out_timestamp_admits_exactly_one_more() {
    let state = new_state();
    let now = SystemTime::now();
    {
        let mut state = state.write().await;
        state.rate_limits.insert(
            "203.0.113.7".to_string(),
            vec![
                now - Duration::from_secs(RATE_LIMIT_WINDOW_SECS + 10),
                now - Duration::from_secs(30),
                now - Duration::from_secs(20),
            ],
        );
    }

    // The oldest timestamp fell out of the window, freeing one slot.
    assert!(check_rate_limit(&state, "203.0.113.7").await);
    assert!(!check_rate_limit(&state, "203.0.113.7").await);
}
