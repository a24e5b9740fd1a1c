use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, REQUEST_TIMEOUT_SECS};

/// A fully assembled notification, ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug)]
pub enum MailError {
    Http(String),
    Status(u16),
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "mail provider request failed: {}", e),
            Self::Status(code) => write!(f, "mail provider returned status {}", code),
        }
    }
}

/// Outbound mail seam. The production impl talks to an HTTP mail provider;
/// tests substitute an in-memory transport.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

/// Delivers notifications through the mail provider's HTTP API.
/// One attempt per submission, no retries.
pub struct HttpMailer {
    http: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl HttpMailer {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: config.mail_api_url.clone(),
            api_token: config.mail_api_token.clone(),
        }
    }
}

#[async_trait]
impl MailTransport for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let payload = serde_json::json!({
            "from": email.from,
            "to": email.to,
            "reply_to": email.reply_to,
            "subject": email.subject,
            "text": email.body,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MailError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
