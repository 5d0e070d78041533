//! Turns a delivery body into a [`GitHubEvent`], given the value of the
//! `X-GitHub-Event` header.
//!
//! Event types without a handler are not errors and come back as `Ok(None)`.
//! A body that lacks a field we rely on is an `Err`, which the endpoint
//! reports as 400.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::types::{
    CommentRef, InvalidRepoName, IssueNumber, IssueRef, IssueState, PullRequestRef, RepoId,
};

use super::events::{
    CommentAction, GitHubEvent, IssueCommentEvent, IssuesEvent, PrAction, PullRequestEvent,
};

#[derive(Debug, Error)]
pub enum ParseError {
    /// Not JSON, or JSON missing a required field.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `repository.full_name` is not `owner/repo`.
    #[error(transparent)]
    InvalidRepository(#[from] InvalidRepoName),
}

/// ```
/// use repo_steward::webhooks::{parse_webhook, GitHubEvent};
///
/// let payload = br#"{
///     "action": "opened",
///     "issue": { "number": 7 },
///     "repository": { "full_name": "octocat/hello-world" }
/// }"#;
///
/// let event = parse_webhook("issues", payload).unwrap().unwrap();
/// assert!(matches!(event, GitHubEvent::Issues(_)));
///
/// assert!(parse_webhook("star", payload).unwrap().is_none());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    match event_type {
        "issue_comment" => parse_issue_comment(payload).map(|e| Some(GitHubEvent::IssueComment(e))),
        "pull_request" => parse_pull_request(payload).map(|e| Some(GitHubEvent::PullRequest(e))),
        "issues" => parse_issues(payload).map(|e| Some(GitHubEvent::Issues(e))),
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures
//
// These mirror GitHub's webhook JSON. Optional on GitHub's side means Option
// (or a serde default) here; everything else is required.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawRepository {
    full_name: String,
}

impl RawRepository {
    fn repo_id(&self) -> Result<RepoId, ParseError> {
        Ok(RepoId::parse_full_name(&self.full_name)?)
    }
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

fn label_names(labels: Vec<RawLabel>) -> Vec<String> {
    labels.into_iter().map(|l| l.name).collect()
}

// ============================================================================
// issue_comment event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    action: String,
    comment: RawComment,
    issue: RawIssue,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    body: Option<String>,
    user: RawUser,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    state: Option<String>,
    body: Option<String>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    user: Option<RawUser>,
    #[serde(default)]
    assignees: Vec<RawUser>,
    #[serde(default)]
    html_url: String,
    updated_at: Option<DateTime<Utc>>,
    // If this field is present, the issue is actually a PR
    pull_request: Option<serde_json::Value>,
}

impl RawIssue {
    fn into_issue_ref(self) -> IssueRef {
        IssueRef {
            number: IssueNumber(self.number),
            title: self.title,
            state: IssueState::from_api(self.state.as_deref().unwrap_or("open")),
            body: self.body,
            labels: label_names(self.labels),
            author: self.user.map(|u| u.login).unwrap_or_default(),
            assignees: self.assignees.into_iter().map(|u| u.login).collect(),
            html_url: self.html_url,
            updated_at: self.updated_at,
            is_pull_request: self.pull_request.is_some(),
        }
    }
}

fn parse_issue_comment(payload: &[u8]) -> Result<IssueCommentEvent, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;

    Ok(IssueCommentEvent {
        repo: raw.repository.repo_id()?,
        action: CommentAction::parse(&raw.action),
        issue: raw.issue.into_issue_ref(),
        comment: CommentRef {
            body: raw.comment.body.unwrap_or_default(),
            author: raw.comment.user.login,
            created_at: raw.comment.created_at,
        },
    })
}

// ============================================================================
// pull_request event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
    requested_reviewer: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    state: Option<String>,
    body: Option<String>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    user: RawUser,
    head: RawRef,
    base: RawRef,
    #[serde(default)]
    changed_files: u64,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    mergeable_state: Option<String>,
    merged: Option<bool>,
    merged_by: Option<RawUser>,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

impl RawPullRequest {
    fn into_pull_request_ref(self) -> PullRequestRef {
        PullRequestRef {
            number: IssueNumber(self.number),
            title: self.title,
            state: IssueState::from_api(self.state.as_deref().unwrap_or("open")),
            body: self.body,
            labels: label_names(self.labels),
            author: self.user.login,
            base_ref: self.base.ref_name,
            head_ref: self.head.ref_name,
            changed_files: self.changed_files,
            additions: self.additions,
            deletions: self.deletions,
            mergeable_state: self.mergeable_state,
            merged: self.merged.unwrap_or(false),
            merged_by: self.merged_by.map(|u| u.login),
            html_url: self.html_url,
        }
    }
}

fn parse_pull_request(payload: &[u8]) -> Result<PullRequestEvent, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    Ok(PullRequestEvent {
        repo: raw.repository.repo_id()?,
        action: PrAction::parse(&raw.action),
        pull_request: raw.pull_request.into_pull_request_ref(),
        requested_reviewer: raw.requested_reviewer.map(|u| u.login),
    })
}

// ============================================================================
// issues event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIssuesPayload {
    action: String,
    issue: RawIssueNumber,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawIssueNumber {
    number: u64,
}

fn parse_issues(payload: &[u8]) -> Result<IssuesEvent, ParseError> {
    let raw: RawIssuesPayload = serde_json::from_slice(payload)?;

    Ok(IssuesEvent {
        repo: raw.repository.repo_id()?,
        action: raw.action,
        number: IssueNumber(raw.issue.number),
    })
}
