//! HTTP server for the repository steward.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Verifies, parses and handles a GitHub delivery inline
//! - `GET /` - Service status as JSON
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

use crate::effects::GitHubInterpreter;
use crate::generation::TextBackend;
use crate::github::RateLimitCache;
use crate::notify::Notifier;
use crate::webhooks::Services;

pub mod health;
pub mod webhook;

pub use health::{ServiceInfo, StatusDocument, health_handler, status_handler};
pub use webhook::{WebhookError, webhook_handler};

/// Shared application state.
///
/// Built once at startup and passed to every handler via axum's `State`
/// extractor. Cloning is cheap.
pub struct AppState<G, B, N> {
    inner: Arc<AppStateInner<G, B, N>>,
}

impl<G, B, N> Clone for AppState<G, B, N> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<G, B, N> {
    services: Services<G, B, N>,

    /// Webhook secret for HMAC-SHA256 signature verification.
    webhook_secret: Vec<u8>,

    info: ServiceInfo,

    /// Last rate-limit window seen by the governor.
    rate_limits: RateLimitCache,
}

impl<G, B, N> AppState<G, B, N>
where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    pub fn new(
        services: Services<G, B, N>,
        webhook_secret: impl Into<Vec<u8>>,
        info: ServiceInfo,
        rate_limits: RateLimitCache,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                services,
                webhook_secret: webhook_secret.into(),
                info,
                rate_limits,
            }),
        }
    }

    pub fn services(&self) -> &Services<G, B, N> {
        &self.inner.services
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    pub fn info(&self) -> &ServiceInfo {
        &self.inner.info
    }

    pub fn rate_limits(&self) -> &RateLimitCache {
        &self.inner.rate_limits
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<G, B, N>(app_state: AppState<G, B, N>) -> axum::Router
where
    G: GitHubInterpreter + 'static,
    B: TextBackend + 'static,
    N: Notifier + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", get(status_handler::<G, B, N>))
        .route("/webhook", post(webhook_handler::<G, B, N>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
