use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::{Config, MAX_MESSAGE_CHARS};
use crate::errors::ApiError;
use crate::mail::{MailTransport, OutboundEmail};
use crate::models::{AppState, ContactSubmission};
use crate::services::check_rate_limit;

#[cfg(test)]
mod tests;

/// Rate-limited relay from the contact form to the mail transport.
pub struct ContactService<M: MailTransport> {
    mailer: M,
    state: Arc<RwLock<AppState>>,
    from: String,
    to: String,
    subject_tag: String,
}

impl<M: MailTransport> ContactService<M> {
    pub fn new(mailer: M, state: Arc<RwLock<AppState>>, config: &Config) -> Self {
        Self {
            mailer,
            state,
            from: config.mail_from.clone(),
            to: config.mail_to.clone(),
            subject_tag: config.mail_subject_tag.clone(),
        }
    }

    /// Validation runs before the quota check so a rejected submission never
    /// consumes a quota slot, and the transport is attempted exactly once.
    pub async fn submit(
        &self,
        client_id: &str,
        submission: &ContactSubmission,
    ) -> Result<(), ApiError> {
        validate(submission)?;

        if !check_rate_limit(&self.state, client_id).await {
            return Err(ApiError::RateLimitExceeded);
        }

        let email = self.build_notification(submission);
        self.mailer.send(&email).await.map_err(|e| {
            log::error!("contact delivery failed: {}", e);
            ApiError::Delivery("Failed to send message".to_string())
        })
    }

    fn build_notification(&self, submission: &ContactSubmission) -> OutboundEmail {
        let name = sanitize(&submission.name);
        let email = sanitize(&submission.email);
        let subject = sanitize(&submission.subject);
        let message = sanitize(&submission.message);

        OutboundEmail {
            from: self.from.clone(),
            to: self.to.clone(),
            reply_to: email.clone(),
            subject: format!("[{}] {}", self.subject_tag, subject),
            body: format!(
                "New contact message\n\nName: {}\nEmail: {}\n\n{}\n",
                name, email, message
            ),
        }
    }
}

pub fn validate(submission: &ContactSubmission) -> Result<(), ApiError> {
    let fields = [
        ("name", &submission.name),
        ("email", &submission.email),
        ("subject", &submission.subject),
        ("message", &submission.message),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!(
                "Missing required field: {}",
                field
            )));
        }
    }
    if submission.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::Validation(format!(
            "Message exceeds maximum length of {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(())
}

/// Best-effort markup stripping: drops script/style elements with their
/// contents, removes any remaining tags, and blanks script-URI schemes.
/// Not a full HTML parser; the notification body is rendered as plain text.
pub fn sanitize(input: &str) -> String {
    let without_blocks = strip_element("style", &strip_element("script", input));
    let without_tags = strip_tags(&without_blocks);
    strip_schemes(&without_tags).trim().to_string()
}

/// Removes `<name ...> ... </name>` blocks, case-insensitively. An opening
/// tag without a close swallows the rest of the input.
fn strip_element(name: &str, input: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with the original input.
    let lower = input.to_ascii_lowercase();
    let open = format!("<{}", name);
    let close = format!("</{}>", name);

    let mut out = String::with_capacity(input.len());
    let mut pos = 0;
    while let Some(start) = lower[pos..].find(&open) {
        let start = pos + start;
        out.push_str(&input[pos..start]);
        match lower[start..].find(&close) {
            Some(end) => pos = start + end + close.len(),
            None => return out,
        }
    }
    out.push_str(&input[pos..]);
    out
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn strip_schemes(input: &str) -> String {
    const SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];
    let mut out = input.to_string();
    for scheme in SCHEMES {
        loop {
            let lower = out.to_ascii_lowercase();
            match lower.find(scheme) {
                Some(idx) => out.replace_range(idx..idx + scheme.len(), ""),
                None => break,
            }
        }
    }
    out
}
