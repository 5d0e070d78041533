//! Event handlers for GitHub webhook events.
//!
//! Handlers run inline, one pipeline per delivery. Every outbound call goes
//! through the injected [`GitHubInterpreter`], so the same handler code runs
//! against the governed octocrab client in production and an in-memory
//! recorder in tests.
//!
//! # Event Types
//!
//! | Event | Handler |
//! |-------|---------|
//! | `issue_comment` | `handle_issue_comment` - assignment requests, replies, PR replies |
//! | `pull_request` | `handle_pull_request` - opened, review requested, merged |
//! | `issues` | `handle_issues` - logged only |

mod issue_comment;
mod issues;
mod pull_request;

use thiserror::Error;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::generation::{ResponseGenerator, TextBackend};
use crate::github::GitHubApiError;
use crate::notify::Notifier;
use crate::style::{ProfilerConfig, build_context, profile_user};
use crate::types::{CommentRef, IssueNumber, IssueRef, PullRequestRef, RepoId, is_automated_login};
use crate::webhooks::GitHubEvent;

pub use issue_comment::{handle_issue_comment, issue_context};
pub use issues::handle_issues;
pub use pull_request::{
    handle_pull_request, is_question, merged_message, pull_request_context, welcome_message,
};

/// Errors that abort handling of a delivery.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A read the handler cannot proceed without failed.
    #[error("failed to {operation}: {source}")]
    GitHub {
        operation: &'static str,
        #[source]
        source: GitHubApiError,
    },

    /// The interpreter answered with a response of the wrong shape.
    #[error("unexpected GitHub response to {0}")]
    UnexpectedResponse(&'static str),
}

/// What the webhook endpoint reports back to GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Processed,
    Ignored,
}

impl HandlerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerOutcome::Processed => "processed",
            HandlerOutcome::Ignored => "ignored",
        }
    }

    fn from_handled(handled: bool) -> Self {
        if handled {
            HandlerOutcome::Processed
        } else {
            HandlerOutcome::Ignored
        }
    }
}

/// The capabilities handlers act through, built once at startup.
pub struct Services<G, B, N> {
    pub github: G,
    pub generator: ResponseGenerator<B>,
    pub notifier: N,
    /// Login the service posts as. Its own comments are never answered.
    pub bot_login: String,
    pub profiler: ProfilerConfig,
}

impl<G, B, N> Services<G, B, N>
where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    /// True for comments this service must not react to.
    pub fn is_ignored_author(&self, login: &str) -> bool {
        is_automated_login(login, &self.bot_login)
    }

    /// Profiles `comment`'s author, then generates a reply in their style.
    ///
    /// Returns `None` when generation fails; callers post nothing.
    async fn styled_reply(
        &self,
        repo: &RepoId,
        comment: &CommentRef,
        base_context: &str,
    ) -> Option<String> {
        let profile = profile_user(&self.github, repo, &comment.author, self.profiler).await;
        let context = build_context(base_context, &profile);
        match self.generator.generate(&comment.body, &context).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::warn!(repo = %repo, user = %comment.author, error = %e, "No response available");
                None
            }
        }
    }

    /// Posts a comment, logging failure. Returns whether it was posted.
    async fn post_comment(&self, repo: &RepoId, issue: IssueNumber, body: String) -> bool {
        let result = self
            .github
            .interpret(GitHubEffect::PostComment {
                repo: repo.clone(),
                issue,
                body,
            })
            .await;
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(repo = %repo, issue = issue.0, error = %e, "Failed to post comment");
                false
            }
        }
    }

    async fn fetch_issue(&self, repo: &RepoId, issue: IssueNumber) -> Result<IssueRef, HandlerError> {
        let effect = GitHubEffect::GetIssue {
            repo: repo.clone(),
            issue,
        };
        match self.github.interpret(effect).await {
            Ok(GitHubResponse::Issue(issue)) => Ok(issue),
            Ok(_) => Err(HandlerError::UnexpectedResponse("get_issue")),
            Err(source) => Err(HandlerError::GitHub {
                operation: "fetch issue",
                source,
            }),
        }
    }

    async fn fetch_pull_request(
        &self,
        repo: &RepoId,
        pr: IssueNumber,
    ) -> Result<PullRequestRef, HandlerError> {
        let effect = GitHubEffect::GetPullRequest {
            repo: repo.clone(),
            pr,
        };
        match self.github.interpret(effect).await {
            Ok(GitHubResponse::PullRequest(pr)) => Ok(pr),
            Ok(_) => Err(HandlerError::UnexpectedResponse("get_pull_request")),
            Err(source) => Err(HandlerError::GitHub {
                operation: "fetch pull request",
                source,
            }),
        }
    }

    async fn list_comments(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
    ) -> Result<Vec<CommentRef>, HandlerError> {
        let effect = GitHubEffect::ListIssueComments {
            repo: repo.clone(),
            issue,
        };
        match self.github.interpret(effect).await {
            Ok(GitHubResponse::Comments(comments)) => Ok(comments),
            Ok(_) => Err(HandlerError::UnexpectedResponse("list_issue_comments")),
            Err(source) => Err(HandlerError::GitHub {
                operation: "list issue comments",
                source,
            }),
        }
    }
}

/// Dispatches a parsed event to its handler.
pub async fn route_event<G, B, N>(
    services: &Services<G, B, N>,
    event: &GitHubEvent,
) -> Result<HandlerOutcome, HandlerError>
where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    tracing::info!(event = event.kind(), repo = %event.repo_id(), "Routing webhook event");
    match event {
        GitHubEvent::IssueComment(e) => handle_issue_comment(services, e).await,
        GitHubEvent::PullRequest(e) => handle_pull_request(services, e).await,
        GitHubEvent::Issues(e) => Ok(handle_issues(e)),
    }
}

/// First `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
