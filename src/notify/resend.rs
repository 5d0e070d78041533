//! Resend email delivery.

use serde::{Deserialize, Serialize};

use super::{Notification, NotifyError};

pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Sends notifications to a single recipient through the Resend API.
#[derive(Debug, Clone)]
pub struct ResendNotifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

impl ResendNotifier {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: RESEND_API_URL.to_string(),
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Points the notifier at a different endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn recipient(&self) -> &str {
        &self.to
    }

    pub(super) async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [self.to.as_str()],
            subject: &notification.subject,
            html: &notification.html,
            text: notification.text.as_deref(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendEmailResponse = response.json().await?;
        tracing::info!(
            subject = %notification.subject,
            email_id = sent.id.as_deref().unwrap_or("unknown"),
            "Notification email sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_missing_text() {
        let request = SendEmailRequest {
            from: "Steward <bot@example.com>",
            to: ["owner@example.com"],
            subject: "s",
            html: "<p>h</p>",
            text: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"], serde_json::json!(["owner@example.com"]));
        assert!(json.get("text").is_none());
    }
}
