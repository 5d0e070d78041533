//! Owner notifications.
//!
//! Handlers report decisions and failures to the repository owner through the
//! [`Notifier`] capability. Email is optional: without Resend credentials the
//! [`OwnerNotifier::Disabled`] variant accepts and drops every notification.
//!
//! Delivery failures are logged by callers and never fail a request.

mod resend;
pub mod templates;

use std::future::Future;

use thiserror::Error;

pub use resend::{RESEND_API_URL, ResendNotifier};

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("email request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email provider rejected the message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers notifications to the repository owner.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification)
    -> impl Future<Output = Result<(), NotifyError>> + Send;

    /// Whether notifications actually go anywhere.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// The notifier chosen at startup.
#[derive(Debug, Clone)]
pub enum OwnerNotifier {
    Resend(ResendNotifier),
    Disabled,
}

impl Notifier for OwnerNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        match self {
            OwnerNotifier::Resend(resend) => resend.deliver(&notification).await,
            OwnerNotifier::Disabled => {
                tracing::debug!(
                    subject = %notification.subject,
                    "Email not configured; skipping notification"
                );
                Ok(())
            }
        }
    }

    fn is_enabled(&self) -> bool {
        matches!(self, OwnerNotifier::Resend(_))
    }
}

/// Sends a notification and logs, rather than returns, any failure.
pub async fn notify_or_log<N: Notifier>(notifier: &N, notification: Notification) {
    let subject = notification.subject.clone();
    if let Err(e) = notifier.notify(notification).await {
        tracing::error!(subject = %subject, error = %e, "Failed to send owner notification");
    }
}
