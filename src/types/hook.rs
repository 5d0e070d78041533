//! Repository webhooks pointing at this service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Events a new hook subscribes to.
pub const HOOK_EVENTS: &[&str] = &[
    "issues",
    "issue_comment",
    "pull_request",
    "pull_request_review",
    "pull_request_review_comment",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookId(pub u64);

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A webhook as GitHub reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoHook {
    pub id: HookId,
    /// `None` for non-web hooks, which carry no delivery URL.
    pub url: Option<String>,
    pub active: bool,
    pub events: Vec<String>,
}

impl RepoHook {
    pub fn delivers_to(&self, url: &str) -> bool {
        self.url.as_deref() == Some(url)
    }
}

/// A web hook to create: JSON deliveries, signed with `secret`, TLS verified.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookSpec {
    pub url: String,
    pub secret: String,
    pub events: Vec<String>,
}

impl HookSpec {
    pub fn new(url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret: secret.into(),
            events: HOOK_EVENTS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl fmt::Debug for HookSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSpec")
            .field("url", &self.url)
            .field("secret", &"<redacted>")
            .field("events", &self.events)
            .finish()
    }
}
