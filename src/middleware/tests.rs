use warp::Filter;

use crate::middleware::cors;

#[tokio::test]
async fn preflight_is_accepted_for_any_origin() {
    let route = warp::any().map(|| "ok").with(cors());

    let response = warp::test::request()
        .method("OPTIONS")
        .path("/")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .reply(&route)
        .await;

    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn simple_request_carries_cors_header() {
    let route = warp::any().map(|| "ok").with(cors());

    let response = warp::test::request()
        .method("GET")
        .path("/")
        .header("origin", "https://example.com")
        .reply(&route)
        .await;

    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn disallowed_method_is_rejected_in_preflight() {
    let route = warp::any().map(|| "ok").with(cors());

    let response = warp::test::request()
        .method("OPTIONS")
        .path("/")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "DELETE")
        .reply(&route)
        .await;

    assert_ne!(response.status(), 200);
}
