use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::contact::ContactService;
use crate::errors::ApiError;
use crate::mail::MailTransport;
use crate::models::{ContactSubmission, PlaylistVideo};
use crate::youtube::{VideoApi, VideoService};


#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct PlaylistBody {
    videos: Vec<PlaylistVideo>,
    count: usize,
}

pub async fn health() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })))
}

pub async fn channel_stats<A: VideoApi>(
    videos: Arc<VideoService<A>>,
) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&videos.channel_stats().await))
}

pub async fn latest_video<A: VideoApi>(
    videos: Arc<VideoService<A>>,
) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&videos.latest_video().await))
}

pub async fn playlist_videos<A: VideoApi>(
    playlist_id: String,
    videos: Arc<VideoService<A>>,
) -> Result<impl Reply, Rejection> {
    let videos = videos.playlist_videos(&playlist_id).await;
    let count = videos.len();
    Ok(warp::reply::json(&PlaylistBody { videos, count }))
}

pub async fn playlists<A: VideoApi>(
    videos: Arc<VideoService<A>>,
) -> Result<impl Reply, Rejection> {
    match videos.playlists().await {
        Ok(playlists) => Ok(warp::reply::json(&playlists)),
        Err(e) => {
            log::error!("playlist fetch error: {}", e);
            Err(warp::reject::custom(ApiError::Upstream(
                "Failed to fetch playlists".to_string(),
            )))
        }
    }
}

pub async fn recent_uploads<A: VideoApi>(
    videos: Arc<VideoService<A>>,
) -> Result<impl Reply, Rejection> {
    match videos.recent_uploads().await {
        Ok(uploads) => Ok(warp::reply::json(&uploads)),
        Err(e) => {
            log::error!("uploads fetch error: {}", e);
            Err(warp::reject::custom(ApiError::Upstream(
                "Failed to fetch uploads".to_string(),
            )))
        }
    }
}

pub async fn submit_contact<M: MailTransport>(
    submission: ContactSubmission,
    forwarded_for: Option<String>,
    remote_addr: Option<SocketAddr>,
    contact: Arc<ContactService<M>>,
) -> Result<impl Reply, Rejection> {
    let client_id = client_id(forwarded_for, remote_addr);
    contact
        .submit(&client_id, &submission)
        .await
        .map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&serde_json::json!({
        "success": true,
        "message": "Message sent",
    })))
}

/// Proxied deployments put the client behind `x-forwarded-for`; fall back
/// to the peer address for direct connections.
fn client_id(forwarded_for: Option<String>, remote_addr: Option<SocketAddr>) -> String {
    forwarded_for
        .and_then(|raw| raw.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| remote_addr.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = err.find::<ApiError>() {
        match e {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Max 3 per hour.".to_string(),
            ),
            ApiError::Delivery(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send message".to_string(),
            ),
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        }
    } else if err.find::<warp::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid request body".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    let body = warp::reply::json(&ErrorBody { error: message });
    Ok(warp::reply::with_status(body, code))
}
