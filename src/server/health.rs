//! Liveness and status endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::AppState;
use crate::effects::GitHubInterpreter;
use crate::generation::TextBackend;
use crate::notify::Notifier;
use crate::types::RateLimitWindow;

/// Facts resolved at startup and reported by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub provider: String,
    pub model: String,
    pub notifications_enabled: bool,
    /// Login the service acts as.
    pub login: String,
    /// Public repositories of that account at startup.
    pub managed_repositories: usize,
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusDocument {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub ai_provider: String,
    pub model: String,
    pub notifications_enabled: bool,
    pub login: String,
    pub managed_repositories: usize,
    /// Most recent rate-limit window seen, if any call has been made yet.
    pub rate_limit: Option<RateLimitWindow>,
}

/// Health check handler.
///
/// Returns 200 OK with the text "OK".
///
/// # Example
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: text/plain
///
/// OK
/// ```
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Status handler for `GET /`.
pub async fn status_handler<G, B, N>(State(app_state): State<AppState<G, B, N>>) -> Json<StatusDocument>
where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    let info = app_state.info();
    Json(StatusDocument {
        status: "running",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        ai_provider: info.provider.clone(),
        model: info.model.clone(),
        notifications_enabled: info.notifications_enabled,
        login: info.login.clone(),
        managed_repositories: info.managed_repositories,
        rate_limit: app_state.rate_limits().get(),
    })
}
