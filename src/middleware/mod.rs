#[cfg(test)]
mod tests;

/// Permissive CORS for the static frontend, which is served from another
/// origin during development.
pub fn cors() -> warp::filters::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"])
}
