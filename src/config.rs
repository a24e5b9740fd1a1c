use std::env;

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const CACHE_TTL_SECS: u64 = 600; // 10 minutes
pub const RATE_LIMIT_MAX_REQUESTS: usize = 3; // contact submissions per window
pub const RATE_LIMIT_WINDOW_SECS: u64 = 3600; // window size in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MAX_MESSAGE_CHARS: usize = 5000;
pub const PLAYLIST_PAGE_SIZE: u32 = 50;
pub const PLAYLISTS_PAGE_SIZE: u32 = 10;
pub const RECENT_UPLOADS_COUNT: u32 = 6;
pub const DEFAULT_PORT: u16 = 3000;

/// Runtime settings loaded from the environment (a `.env` file is honored).
#[derive(Debug, Clone)]
pub struct Config {
    pub youtube_api_key: String,
    pub channel_id: Option<String>,
    pub channel_handle: Option<String>,
    /// When set, the latest-video lookup only considers uploads from the last N days.
    pub latest_window_days: Option<i64>,
    pub mail_api_url: String,
    pub mail_api_token: String,
    pub mail_from: String,
    pub mail_to: String,
    pub mail_subject_tag: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let youtube_api_key = require("YOUTUBE_API_KEY")?;
        let channel_id = optional("CHANNEL_ID");
        let channel_handle = optional("CHANNEL_HANDLE");
        if channel_id.is_none() && channel_handle.is_none() {
            return Err("either CHANNEL_ID or CHANNEL_HANDLE must be set".to_string());
        }

        let latest_window_days = match optional("LATEST_VIDEO_WINDOW_DAYS") {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| format!("LATEST_VIDEO_WINDOW_DAYS is not a number: {}", raw))?,
            ),
            None => None,
        };

        let port = match optional("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("PORT is not a valid port number: {}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            youtube_api_key,
            channel_id,
            channel_handle,
            latest_window_days,
            mail_api_url: require("MAIL_API_URL")?,
            mail_api_token: require("MAIL_API_TOKEN")?,
            mail_from: require("MAIL_FROM")?,
            mail_to: require("MAIL_TO")?,
            mail_subject_tag: optional("MAIL_SUBJECT_TAG").unwrap_or_else(|| "KPLAYZ".to_string()),
            port,
        })
    }
}

fn require(name: &str) -> Result<String, String> {
    optional(name).ok_or_else(|| format!("missing required environment variable {}", name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
