//! Issue, pull request and comment snapshots.
//!
//! These are read fresh from GitHub on every request (or synthesized from the
//! webhook payload when a round-trip would add nothing). Nothing here is
//! persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::IssueNumber;

/// Open/closed state shared by issues and pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// Parses GitHub's `state` field. Anything other than `"closed"` is open.
    pub fn from_api(state: &str) -> Self {
        if state.eq_ignore_ascii_case("closed") {
            IssueState::Closed
        } else {
            IssueState::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

/// The fields of an issue the handlers need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub number: IssueNumber,
    pub title: String,
    pub state: IssueState,
    pub body: Option<String>,
    pub labels: Vec<String>,
    pub author: String,
    /// Logins of the current assignees. Arbitration only runs while empty.
    pub assignees: Vec<String>,
    pub html_url: String,
    pub updated_at: Option<DateTime<Utc>>,
    /// True when GitHub embedded a `pull_request` marker in the issue.
    pub is_pull_request: bool,
}

impl IssueRef {
    pub fn is_assigned(&self) -> bool {
        !self.assignees.is_empty()
    }
}

/// The fields of a pull request the handlers need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: IssueNumber,
    pub title: String,
    pub state: IssueState,
    pub body: Option<String>,
    pub labels: Vec<String>,
    pub author: String,
    pub base_ref: String,
    pub head_ref: String,
    pub changed_files: u64,
    pub additions: u64,
    pub deletions: u64,
    pub mergeable_state: Option<String>,
    pub merged: bool,
    pub merged_by: Option<String>,
    pub html_url: String,
}

/// A comment, reduced to what the handlers read.
///
/// Built either from a listed API comment or directly from the webhook's
/// `comment` object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentRef {
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl CommentRef {
    pub fn new(
        body: impl Into<String>,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        CommentRef {
            body: body.into(),
            author: author.into(),
            created_at,
        }
    }
}

/// Logins the service never reacts to: GitHub App accounts such as
/// `dependabot[bot]`, and the login the service itself posts as.
pub fn is_automated_login(login: &str, service_login: &str) -> bool {
    login.ends_with("[bot]") || login.eq_ignore_ascii_case(service_login)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_state_from_api() {
        assert_eq!(IssueState::from_api("open"), IssueState::Open);
        assert_eq!(IssueState::from_api("closed"), IssueState::Closed);
        assert_eq!(IssueState::from_api("CLOSED"), IssueState::Closed);
        assert_eq!(IssueState::from_api("something-new"), IssueState::Open);
    }

    #[test]
    fn automated_logins() {
        assert!(is_automated_login("dependabot[bot]", "steward-bot"));
        assert!(is_automated_login("Steward-Bot", "steward-bot"));
        assert!(!is_automated_login("octocat", "steward-bot"));
        assert!(!is_automated_login("robot", "steward-bot"));
    }
}
