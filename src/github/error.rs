//! Failures of GitHub calls, sorted into ones worth repeating and ones not.

use std::fmt;
use thiserror::Error;

use crate::retry::Retriable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// 5xx, 429, rate-limited 403s and network trouble.
    Transient,
    /// Anything else, including responses missing fields we need.
    Permanent,
}

impl GitHubErrorKind {
    pub fn is_retriable(&self) -> bool {
        *self == GitHubErrorKind::Transient
    }
}

#[derive(Debug, Error)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GitHub API error")?;
        if let Some(code) = self.status_code {
            write!(f, " (HTTP {code})")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl Retriable for GitHubApiError {
    fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }
}

impl GitHubApiError {
    fn bare(kind: GitHubErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::bare(GitHubErrorKind::Permanent, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::bare(GitHubErrorKind::Transient, message)
    }

    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let message = match &err {
            octocrab::Error::GitHub { source, .. } => source.message.clone(),
            other => other.to_string(),
        };
        let status_code = match &err {
            octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
            other => status_in_text(&other.to_string()),
        };
        let transport = matches!(
            err,
            octocrab::Error::Hyper { .. } | octocrab::Error::Service { .. }
        );

        let kind = if transport {
            GitHubErrorKind::Transient
        } else {
            classify(status_code, &message)
        };
        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }
}

fn classify(status_code: Option<u16>, message: &str) -> GitHubErrorKind {
    let text = message.to_lowercase();
    let rate_limited = ["rate limit", "secondary rate", "abuse detection"]
        .iter()
        .any(|needle| text.contains(needle));
    let network = ["timeout", "timed out", "connection", "network", "dns"]
        .iter()
        .any(|needle| text.contains(needle));

    let transient = match status_code {
        Some(code) => code == 429 || code >= 500 || (code == 403 && rate_limited),
        None => rate_limited || network,
    };
    if transient {
        GitHubErrorKind::Transient
    } else {
        GitHubErrorKind::Permanent
    }
}

/// Best-effort status recovery for errors that only carry text.
fn status_in_text(text: &str) -> Option<u16> {
    let (_, rest) = text.split_once("status: ")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
