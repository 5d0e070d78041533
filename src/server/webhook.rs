//! Webhook endpoint handler.
//!
//! Verifies the delivery signature, parses the event and runs its handler
//! inline before answering GitHub.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::effects::GitHubInterpreter;
use crate::generation::TextBackend;
use crate::notify::{Notifier, notify_or_log, templates};
use crate::webhooks::{HandlerError, ParseError, parse_webhook, route_event, verify_delivery};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing or wrong signature.
    #[error("invalid signature")]
    InvalidSignature,

    #[error("missing X-GitHub-Event header")]
    MissingEventType,

    #[error("empty payload")]
    EmptyPayload,

    /// The payload does not have the shape its event type requires.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),

    /// The handler failed after the delivery was accepted.
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebhookError::InvalidSignature => (StatusCode::UNAUTHORIZED, "Invalid signature"),
            WebhookError::MissingEventType => (StatusCode::BAD_REQUEST, "No event type"),
            WebhookError::EmptyPayload => (StatusCode::BAD_REQUEST, "No payload"),
            WebhookError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "Invalid payload"),
            // Internal detail stays in the logs.
            WebhookError::Handler(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload
///   - `X-GitHub-Event`: Event type (e.g., "pull_request", "issue_comment")
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: `{"status": "processed"}` or `{"status": "ignored"}`
/// - 400 Bad Request: Missing event type, empty or malformed payload
/// - 401 Unauthorized: Missing or invalid signature
/// - 500 Internal Server Error: Handler failure (reported to the owner)
pub async fn webhook_handler<G, B, N>(
    State(app_state): State<AppState<G, B, N>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, WebhookError>
where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    let delivery_id = header(&headers, HEADER_DELIVERY).unwrap_or("-");

    // Verify signature BEFORE any parsing.
    if !verify_delivery(
        &body,
        header(&headers, HEADER_SIGNATURE),
        app_state.webhook_secret(),
    ) {
        warn!(delivery_id, "Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let event_type = header(&headers, HEADER_EVENT).ok_or(WebhookError::MissingEventType)?;
    if body.is_empty() {
        return Err(WebhookError::EmptyPayload);
    }

    info!(delivery_id, event_type, "Received webhook event");

    let event = match parse_webhook(event_type, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!(delivery_id, event_type, "No handler for event type");
            return Ok(status("ignored"));
        }
        Err(e) => {
            warn!(delivery_id, event_type, error = %e, "Malformed webhook payload");
            return Err(e.into());
        }
    };

    match route_event(app_state.services(), &event).await {
        Ok(outcome) => {
            debug!(delivery_id, event_type, outcome = outcome.as_str(), "Webhook handled");
            Ok(status(outcome.as_str()))
        }
        Err(e) => {
            error!(delivery_id, event_type, error = %e, "Error processing webhook");
            let report = templates::error_report(event.kind(), &e.to_string(), Utc::now());
            notify_or_log(&app_state.services().notifier, report).await;
            Err(e.into())
        }
    }
}

fn status(value: &str) -> Json<serde_json::Value> {
    Json(json!({ "status": value }))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
