pub mod config;
pub mod contact;
pub mod errors;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod services;
pub mod youtube;

pub use errors::ApiError;
pub use models::{AppState, CacheEntry, ContactSubmission};
