//! Handler for `issue_comment` events.
//!
//! A new comment on an issue is either an assignment request (handed to the
//! arbitrator) or something to answer. Comments on pull requests arrive
//! through the same event and are passed on to the pull-request path.

use super::{HandlerError, HandlerOutcome, Services, pull_request, truncate_chars};
use crate::assignment::{ArbitrationInput, arbitrate, is_assignment_request};
use crate::effects::GitHubInterpreter;
use crate::generation::TextBackend;
use crate::notify::Notifier;
use crate::types::IssueRef;
use crate::webhooks::events::{CommentAction, IssueCommentEvent};

/// Characters of an issue or PR description included in generation context.
pub(super) const DESCRIPTION_LIMIT: usize = 500;

/// Handles an `issue_comment` event.
pub async fn handle_issue_comment<G, B, N>(
    services: &Services<G, B, N>,
    event: &IssueCommentEvent,
) -> Result<HandlerOutcome, HandlerError>
where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    if event.action != CommentAction::Created {
        tracing::debug!(action = ?event.action, "Ignoring issue_comment action");
        return Ok(HandlerOutcome::Ignored);
    }

    if services.is_ignored_author(&event.comment.author) {
        tracing::debug!(
            author = %event.comment.author,
            issue = event.issue.number.0,
            "Skipping comment from a bot"
        );
        return Ok(HandlerOutcome::Ignored);
    }

    if event.is_on_pull_request() {
        return pull_request::handle_pull_request_comment(services, event).await;
    }

    if is_assignment_request(&event.comment.body) {
        return handle_assignment_request(services, event).await;
    }

    let context = issue_context(&event.issue);
    let Some(reply) = services
        .styled_reply(&event.repo, &event.comment, &context)
        .await
    else {
        return Ok(HandlerOutcome::Ignored);
    };

    let posted = services
        .post_comment(&event.repo, event.issue.number, reply)
        .await;
    if posted {
        tracing::info!(repo = %event.repo, issue = event.issue.number.0, "Replied to issue comment");
    }
    Ok(HandlerOutcome::from_handled(posted))
}

async fn handle_assignment_request<G, B, N>(
    services: &Services<G, B, N>,
    event: &IssueCommentEvent,
) -> Result<HandlerOutcome, HandlerError>
where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    // The payload's assignee list is enough to rule the issue out.
    if event.issue.is_assigned() {
        tracing::debug!(
            issue = event.issue.number.0,
            assignees = ?event.issue.assignees,
            "Assignment requested on an assigned issue"
        );
        return Ok(HandlerOutcome::Ignored);
    }

    let issue = services.fetch_issue(&event.repo, event.issue.number).await?;
    if issue.is_assigned() {
        tracing::debug!(issue = issue.number.0, "Issue was assigned since the delivery was sent");
        return Ok(HandlerOutcome::Ignored);
    }
    let mut comments = services.list_comments(&event.repo, issue.number).await?;
    if !comments.contains(&event.comment) {
        comments.push(event.comment.clone());
    }

    let outcome = arbitrate(
        &services.github,
        &services.notifier,
        ArbitrationInput {
            repo: &event.repo,
            issue: &issue,
            comments: &comments,
            bot_login: &services.bot_login,
        },
    )
    .await;

    tracing::info!(repo = %event.repo, issue = issue.number.0, ?outcome, "Arbitration finished");
    Ok(HandlerOutcome::from_handled(outcome.is_handled()))
}

/// Situational context for replies on an issue.
pub fn issue_context(issue: &IssueRef) -> String {
    let mut parts = vec![
        format!("Issue #{}: {}", issue.number.0, issue.title),
        format!("State: {}", issue.state.as_str()),
    ];
    if let Some(body) = issue.body.as_deref().filter(|b| !b.is_empty()) {
        parts.push(format!(
            "Description: {}",
            truncate_chars(body, DESCRIPTION_LIMIT)
        ));
    }
    if !issue.labels.is_empty() {
        parts.push(format!("Labels: {}", issue.labels.join(", ")));
    }
    parts.join("\n")
}
