//! Rate-limit governor.
//!
//! [`Governed`] wraps any [`GitHubInterpreter`]. Before each effect it asks
//! the wrapped interpreter for the current core rate-limit window and, when
//! fewer than ten calls remain, sleeps until the reported reset plus one
//! second. The rate-limit query itself is never governed.
//!
//! Each request pipeline checks and sleeps on its own task. The last window
//! seen is kept in a [`RateLimitCache`] shared with the status endpoint.
//!
//! A failed rate-limit query is logged and the effect proceeds unthrottled.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::RateLimitWindow;

use super::error::GitHubApiError;

/// The most recently observed rate-limit window, shared across requests.
#[derive(Debug, Clone, Default)]
pub struct RateLimitCache {
    window: Arc<Mutex<Option<RateLimitWindow>>>,
}

impl RateLimitCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<RateLimitWindow> {
        match self.window.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set(&self, window: RateLimitWindow) {
        match self.window.lock() {
            Ok(mut guard) => *guard = Some(window),
            Err(poisoned) => *poisoned.into_inner() = Some(window),
        }
    }
}

/// An interpreter that throttles on low rate-limit quota.
#[derive(Debug, Clone)]
pub struct Governed<G> {
    inner: G,
    cache: RateLimitCache,
}

impl<G: GitHubInterpreter> Governed<G> {
    pub fn new(inner: G, cache: RateLimitCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn cache(&self) -> &RateLimitCache {
        &self.cache
    }

    /// Refreshes the window and sleeps if it is exhausted.
    async fn wait_for_quota(&self, effect_name: &'static str) {
        let window = match self.inner.interpret(GitHubEffect::GetRateLimit).await {
            Ok(GitHubResponse::RateLimit(window)) => window,
            Ok(other) => {
                tracing::warn!(
                    effect = effect_name,
                    response = ?other,
                    "Unexpected rate-limit response; proceeding unthrottled"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(
                    effect = effect_name,
                    error = %e,
                    "Rate-limit check failed; proceeding unthrottled"
                );
                return;
            }
        };

        self.cache.set(window);

        let wait = window.wait_duration(Utc::now());
        if !wait.is_zero() {
            tracing::warn!(
                effect = effect_name,
                remaining = window.remaining,
                limit = window.limit,
                reset_at = %window.reset_at,
                wait_secs = wait.as_secs(),
                "Rate limit nearly exhausted; waiting for reset"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl<G: GitHubInterpreter> GitHubInterpreter for Governed<G> {
    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        if !matches!(effect, GitHubEffect::GetRateLimit) {
            self.wait_for_quota(effect.name()).await;
        }
        self.inner.interpret(effect).await
    }
}
