use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::{Config, RATE_LIMIT_MAX_REQUESTS};
use crate::contact::{sanitize, validate, ContactService};
use crate::errors::ApiError;
use crate::mail::{MailError, MailTransport, OutboundEmail};
use crate::models::{AppState, ContactSubmission};

fn test_config() -> Config {
    Config {
        youtube_api_key: "test-key".to_string(),
        channel_id: Some("UC123".to_string()),
        channel_handle: None,
        latest_window_days: None,
        mail_api_url: "http://localhost/send".to_string(),
        mail_api_token: "token".to_string(),
        mail_from: "site@example.com".to_string(),
        mail_to: "owner@example.com".to_string(),
        mail_subject_tag: "TEST".to_string(),
        port: 3000,
    }
}

fn submission() -> ContactSubmission {
    ContactSubmission {
        name: "A".to_string(),
        email: "a@b.com".to_string(),
        subject: "Hi".to_string(),
        message: "hello there".to_string(),
    }
}

/// Captures sent mail in memory; `fail` scripts a provider outage.
#[derive(Default)]
struct MockTransport {
    fail: bool,
    sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl MailTransport for Arc<MockTransport> {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Status(502));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

fn service(
    transport: Arc<MockTransport>,
) -> (ContactService<Arc<MockTransport>>, Arc<RwLock<AppState>>) {
    let state = Arc::new(RwLock::new(AppState::new()));
    let service = ContactService::new(transport, state.clone(), &test_config());
    (service, state)
}

#[tokio::test]
async fn valid_submission_is_delivered() {
    let transport = Arc::new(MockTransport::default());
    let (service, _state) = service(transport.clone());

    service.submit("203.0.113.7", &submission()).await.unwrap();

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reply_to, "a@b.com");
    assert_eq!(sent[0].to, "owner@example.com");
    assert_eq!(sent[0].subject, "[TEST] Hi");
    assert!(sent[0].body.contains("hello there"));
}

#[tokio::test]
async fn script_tag_is_stripped_from_forwarded_text() {
    let transport = Arc::new(MockTransport::default());
    let (service, _state) = service(transport.clone());

    let mut submission = submission();
    submission.message = "<script>alert(1)</script>hello".to_string();
    service.submit("203.0.113.7", &submission).await.unwrap();

    let sent = transport.sent.lock().unwrap();
    assert!(sent[0].body.contains("hello"));
    assert!(!sent[0].body.contains("script"));
    assert!(!sent[0].body.contains("alert"));
}

#[tokio::test]
async fn missing_subject_is_rejected_without_side_effects() {
    let transport = Arc::new(MockTransport::default());
    let (service, state) = service(transport.clone());

    let mut submission = submission();
    submission.subject = String::new();
    let err = service.submit("203.0.113.7", &submission).await.unwrap_err();

    match err {
        ApiError::Validation(msg) => assert!(msg.contains("subject")),
        other => panic!("expected validation error, got {}", other),
    }
    assert!(transport.sent.lock().unwrap().is_empty());
    // No quota slot consumed either.
    assert!(state.read().await.rate_limits.get("203.0.113.7").is_none());
}

#[tokio::test]
async fn oversized_message_is_rejected_for_length() {
    let transport = Arc::new(MockTransport::default());
    let (service, _state) = service(transport.clone());

    let mut submission = submission();
    submission.message = "x".repeat(6000);
    let err = service.submit("203.0.113.7", &submission).await.unwrap_err();

    match err {
        ApiError::Validation(msg) => assert!(msg.contains("5000")),
        other => panic!("expected validation error, got {}", other),
    }
}

#[tokio::test]
async fn fourth_submission_in_window_hits_the_quota() {
    let transport = Arc::new(MockTransport::default());
    let (service, _state) = service(transport.clone());

    for _ in 0..RATE_LIMIT_MAX_REQUESTS {
        service.submit("203.0.113.7", &submission()).await.unwrap();
    }
    let err = service.submit("203.0.113.7", &submission()).await.unwrap_err();

    assert!(matches!(err, ApiError::RateLimitExceeded));
    assert_eq!(
        transport.sent.lock().unwrap().len(),
        RATE_LIMIT_MAX_REQUESTS
    );
}

#[tokio::test]
async fn transport_failure_is_a_delivery_error() {
    let transport = Arc::new(MockTransport {
        fail: true,
        ..MockTransport::default()
    });
    let (service, _state) = service(transport.clone());

    let err = service.submit("203.0.113.7", &submission()).await.unwrap_err();
    assert!(matches!(err, ApiError::Delivery(_)));
}

#[test]
fn validate_names_each_missing_field() {
    for field in ["name", "email", "subject", "message"] {
        let mut submission = submission();
        match field {
            "name" => submission.name = "   ".to_string(),
            "email" => submission.email = String::new(),
            "subject" => submission.subject = String::new(),
            _ => submission.message = String::new(),
        }
        match validate(&submission) {
            Err(ApiError::Validation(msg)) => assert!(msg.contains(field)),
            other => panic!("expected validation error for {}, got {:?}", field, other),
        }
    }
}

#[test]
fn sanitize_strips_markup_and_schemes() {
    assert_eq!(sanitize("<script>alert(1)</script>hello"), "hello");
    assert_eq!(sanitize("<b>bold</b> move"), "bold move");
    assert_eq!(sanitize("<SCRIPT src=x>evil()</SCRIPT>ok"), "ok");
    assert_eq!(sanitize("<style>p{}</style>text"), "text");
    assert_eq!(sanitize("click javascript:alert(1)"), "click alert(1)");
    assert_eq!(sanitize("JaVaScRiPt:run()"), "run()");
    assert_eq!(sanitize("  plain text  "), "plain text");
}

#[test]
fn sanitize_handles_unterminated_script_block() {
    assert_eq!(sanitize("before<script>never closed"), "before");
}
