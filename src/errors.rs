use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    RateLimitExceeded,
    Delivery(String),
    Upstream(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            Self::Delivery(msg) => write!(f, "Delivery error: {}", msg),
            Self::Upstream(msg) => write!(f, "Upstream error: {}", msg),
        }
    }
}

impl warp::reject::Reject for ApiError {}
