use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::sync::RwLock;
use warp::Filter;

use channel_backend::{
    config::Config,
    contact::ContactService,
    handlers,
    mail::HttpMailer,
    middleware,
    models::AppState,
    youtube::{VideoService, YouTubeApi},
};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("configuration error: {}", e);
            std::process::exit(1);
        }
    };
    let port = config.port;

    let state = Arc::new(RwLock::new(AppState::new()));
    let videos = Arc::new(VideoService::new(
        YouTubeApi::new(&config),
        state.clone(),
        &config,
    ));
    let contact = Arc::new(ContactService::new(
        HttpMailer::new(&config),
        state.clone(),
        &config,
    ));

    let videos_filter = warp::any().map(move || videos.clone());
    let contact_filter = warp::any().map(move || contact.clone());

    let health = warp::path!("api" / "health")
        .and(warp::get())
        .and_then(handlers::health);

    let stats = warp::path!("api" / "youtube" / "stats")
        .and(warp::get())
        .and(videos_filter.clone())
        .and_then(handlers::channel_stats);

    let latest = warp::path!("api" / "youtube" / "latest")
        .and(warp::get())
        .and(videos_filter.clone())
        .and_then(handlers::latest_video);

    let playlist = warp::path!("api" / "youtube" / "playlist" / String)
        .and(warp::get())
        .and(videos_filter.clone())
        .and_then(handlers::playlist_videos);

    let playlists = warp::path!("api" / "youtube" / "playlists")
        .and(warp::get())
        .and(videos_filter.clone())
        .and_then(handlers::playlists);

    let uploads = warp::path!("api" / "youtube" / "uploads")
        .and(warp::get())
        .and(videos_filter)
        .and_then(handlers::recent_uploads);

    let contact_route = warp::path!("api" / "contact")
        .and(warp::post())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::json())
        .and(warp::header::optional::<String>("x-forwarded-for"))
        .and(warp::addr::remote())
        .and(contact_filter)
        .and_then(handlers::submit_contact);

    let routes = health
        .or(stats)
        .or(latest)
        .or(playlist)
        .or(playlists)
        .or(uploads)
        .or(contact_route)
        .recover(handlers::handle_rejection)
        .with(middleware::cors())
        .with(warp::log("channel_backend"));

    log::info!("server running on http://0.0.0.0:{}", port);
    warp::serve(routes).run((Ipv4Addr::UNSPECIFIED, port)).await;
}
