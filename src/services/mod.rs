use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::{RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW_SECS};
use crate::models::{AppState, CacheEntry};

#[cfg(test)]
mod tests;

/// Returns the cached value under `key` if present and not expired.
/// Expired entries are left in place; the next `cache_put` overwrites them.
pub async fn cache_get<T: DeserializeOwned>(state: &Arc<RwLock<AppState>>, key: &str) -> Option<T> {
    let state = state.read().await;
    let entry = state.cache.get(key)?;
    if SystemTime::now() >= entry.expires_at {
        return None;
    }
    match serde_json::from_value(entry.value.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("cache entry {} has unexpected shape: {}", key, e);
            None
        }
    }
}

pub async fn cache_put<T: Serialize>(
    state: &Arc<RwLock<AppState>>,
    key: &str,
    value: &T,
    ttl_secs: u64,
) {
    let value = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("failed to serialize cache entry {}: {}", key, e);
            return;
        }
    };
    let mut state = state.write().await;
    state.cache.insert(
        key.to_string(),
        CacheEntry {
            value,
            expires_at: SystemTime::now() + Duration::from_secs(ttl_secs),
        },
    );
}

/// Sliding-window quota check. Prunes timestamps older than the window,
/// rejects at the quota without recording the attempt, otherwise records
/// the attempt and allows it. The write guard is held across the whole
/// prune/check/append sequence so concurrent requests cannot lose updates.
pub async fn check_rate_limit(state: &Arc<RwLock<AppState>>, client_id: &str) -> bool {
    let mut state = state.write().await;
    let now = SystemTime::now();
    let window = Duration::from_secs(RATE_LIMIT_WINDOW_SECS);

    let timestamps = state.rate_limits.entry(client_id.to_string()).or_default();
    timestamps.retain(|t| match now.duration_since(*t) {
        Ok(age) => age < window,
        Err(_) => true,
    });

    if timestamps.len() >= RATE_LIMIT_MAX_REQUESTS {
        return false;
    }
    timestamps.push(now);
    true
}
