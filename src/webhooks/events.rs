//! GitHub webhook event types.
//!
//! Typed representations of the three webhook events the steward routes:
//!
//! - `issue_comment` - assignment requests and replies (issues and PRs)
//! - `pull_request` - opened, review requested, merged
//! - `issues` - logged only

use serde::{Deserialize, Serialize};

use crate::types::{CommentRef, IssueNumber, IssueRef, PullRequestRef, RepoId};

/// A parsed GitHub webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitHubEvent {
    /// A comment on an issue or on a PR's conversation tab.
    ///
    /// GitHub delivers PR conversation comments as `issue_comment`; the
    /// embedded `pull_request` marker on the issue tells them apart.
    IssueComment(IssueCommentEvent),

    /// A pull request lifecycle change.
    PullRequest(PullRequestEvent),

    /// An issue lifecycle change.
    Issues(IssuesEvent),
}

impl GitHubEvent {
    /// Returns the repository this event belongs to.
    pub fn repo_id(&self) -> &RepoId {
        match self {
            GitHubEvent::IssueComment(e) => &e.repo,
            GitHubEvent::PullRequest(e) => &e.repo,
            GitHubEvent::Issues(e) => &e.repo,
        }
    }

    /// The `X-GitHub-Event` name this event was parsed from.
    pub fn kind(&self) -> &'static str {
        match self {
            GitHubEvent::IssueComment(_) => "issue_comment",
            GitHubEvent::PullRequest(_) => "pull_request",
            GitHubEvent::Issues(_) => "issues",
        }
    }
}

/// Action performed on an issue comment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
    /// An action this service does not know about.
    Other(String),
}

impl CommentAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "created" => CommentAction::Created,
            "edited" => CommentAction::Edited,
            "deleted" => CommentAction::Deleted,
            other => CommentAction::Other(other.to_string()),
        }
    }
}

/// An `issue_comment` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub repo: RepoId,
    pub action: CommentAction,
    /// The issue as embedded in the payload (may be stale; handlers refetch
    /// when they need current assignees).
    pub issue: IssueRef,
    /// The comment that triggered the delivery.
    pub comment: CommentRef,
}

impl IssueCommentEvent {
    /// True when the comment was made on a pull request.
    pub fn is_on_pull_request(&self) -> bool {
        self.issue.is_pull_request
    }
}

/// Action performed on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    Opened,
    ReviewRequested,
    /// Closed, merged or not. Check [`PullRequestRef::merged`].
    Closed,
    Other(String),
}

impl PrAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "opened" => PrAction::Opened,
            "review_requested" => PrAction::ReviewRequested,
            "closed" => PrAction::Closed,
            other => PrAction::Other(other.to_string()),
        }
    }
}

/// A `pull_request` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub repo: RepoId,
    pub action: PrAction,
    pub pull_request: PullRequestRef,
    /// Set for `review_requested` when a user (not a team) was requested.
    pub requested_reviewer: Option<String>,
}

/// An `issues` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesEvent {
    pub repo: RepoId,
    pub action: String,
    pub number: IssueNumber,
}
