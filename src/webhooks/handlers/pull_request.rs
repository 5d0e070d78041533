//! Handlers for pull request activity.
//!
//! Two entry points: `pull_request` lifecycle events, and comments on a
//! PR's conversation tab (delivered as `issue_comment`).

use chrono::Utc;

use super::issue_comment::DESCRIPTION_LIMIT;
use super::{HandlerError, HandlerOutcome, Services, truncate_chars};
use crate::effects::GitHubInterpreter;
use crate::generation::TextBackend;
use crate::notify::{Notifier, notify_or_log, templates};
use crate::types::PullRequestRef;
use crate::webhooks::events::{IssueCommentEvent, PrAction, PullRequestEvent};

/// Characters of a question quoted in the owner notification.
const QUESTION_EXCERPT: usize = 200;

const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "when", "where", "who", "which", "can", "could", "would", "should",
];

/// True if `text` contains `?` or starts with a question word.
pub fn is_question(text: &str) -> bool {
    if text.contains('?') {
        return true;
    }
    text.split_whitespace()
        .next()
        .map(|w| QUESTION_WORDS.contains(&w.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Situational context for replies on a pull request.
pub fn pull_request_context(pr: &PullRequestRef) -> String {
    let mut parts = vec![
        format!("Pull Request #{}: {}", pr.number.0, pr.title),
        format!("State: {}", pr.state.as_str()),
        format!("Base branch: {}", pr.base_ref),
        format!("Head branch: {}", pr.head_ref),
    ];
    if let Some(body) = pr.body.as_deref().filter(|b| !b.is_empty()) {
        parts.push(format!(
            "Description: {}",
            truncate_chars(body, DESCRIPTION_LIMIT)
        ));
    }
    if !pr.labels.is_empty() {
        parts.push(format!("Labels: {}", pr.labels.join(", ")));
    }
    parts.push(format!("Files changed: {}", pr.changed_files));
    parts.push(format!(
        "Additions: +{}, Deletions: -{}",
        pr.additions, pr.deletions
    ));
    if let Some(state) = pr.mergeable_state.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("Mergeable state: {state}"));
    }
    parts.join("\n")
}

pub fn welcome_message(author: &str) -> String {
    format!(
        "Thank you @{author} for your pull request! 🎉\n\n\
         I'll help answer any questions you might have. \
         A maintainer will review your changes soon."
    )
}

pub fn merged_message(author: &str) -> String {
    format!(
        "🎉 Congratulations @{author}! Your pull request has been merged. \
         Thank you for your contribution!"
    )
}

/// Handles a `pull_request` event.
pub async fn handle_pull_request<G, B, N>(
    services: &Services<G, B, N>,
    event: &PullRequestEvent,
) -> Result<HandlerOutcome, HandlerError>
where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    let pr = &event.pull_request;
    match &event.action {
        PrAction::Opened => {
            tracing::info!(repo = %event.repo, pr = pr.number.0, title = %pr.title, "Pull request opened");
            report(
                services,
                event,
                "New Pull Request",
                &format!(
                    "Opened by @{} from {} to {}",
                    pr.author, pr.head_ref, pr.base_ref
                ),
            )
            .await;
            let posted = services
                .post_comment(&event.repo, pr.number, welcome_message(&pr.author))
                .await;
            Ok(HandlerOutcome::from_handled(posted))
        }
        PrAction::ReviewRequested => {
            let Some(reviewer) = event.requested_reviewer.as_deref() else {
                tracing::debug!(pr = pr.number.0, "Review requested from a team; ignoring");
                return Ok(HandlerOutcome::Ignored);
            };
            tracing::info!(repo = %event.repo, pr = pr.number.0, reviewer, "Review requested");
            report(
                services,
                event,
                "Review Requested",
                &format!("Review requested from @{reviewer}"),
            )
            .await;
            Ok(HandlerOutcome::Processed)
        }
        PrAction::Closed if pr.merged => {
            tracing::info!(repo = %event.repo, pr = pr.number.0, title = %pr.title, "Pull request merged");
            let merger = pr.merged_by.as_deref().unwrap_or("unknown");
            report(
                services,
                event,
                "Pull Request Merged",
                &format!("Merged by @{merger}"),
            )
            .await;
            let posted = services
                .post_comment(&event.repo, pr.number, merged_message(&pr.author))
                .await;
            Ok(HandlerOutcome::from_handled(posted))
        }
        action => {
            tracing::debug!(?action, pr = pr.number.0, "Ignoring pull_request action");
            Ok(HandlerOutcome::Ignored)
        }
    }
}

async fn report<G, B, N>(
    services: &Services<G, B, N>,
    event: &PullRequestEvent,
    activity: &str,
    details: &str,
) where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    let pr = &event.pull_request;
    let notification = templates::pull_request_activity(
        &event.repo,
        pr.number,
        &pr.title,
        activity,
        details,
        &pr.html_url,
        Utc::now(),
    );
    notify_or_log(&services.notifier, notification).await;
}

/// Replies to a comment on a pull request; questions are also reported to
/// the owner once the reply is posted.
pub(super) async fn handle_pull_request_comment<G, B, N>(
    services: &Services<G, B, N>,
    event: &IssueCommentEvent,
) -> Result<HandlerOutcome, HandlerError>
where
    G: GitHubInterpreter,
    B: TextBackend,
    N: Notifier,
{
    let pr = services
        .fetch_pull_request(&event.repo, event.issue.number)
        .await?;
    let context = pull_request_context(&pr);

    let Some(reply) = services
        .styled_reply(&event.repo, &event.comment, &context)
        .await
    else {
        return Ok(HandlerOutcome::Ignored);
    };

    if !services.post_comment(&event.repo, pr.number, reply).await {
        return Ok(HandlerOutcome::Ignored);
    }
    tracing::info!(repo = %event.repo, pr = pr.number.0, "Replied to pull request comment");

    if is_question(&event.comment.body) {
        let details = format!(
            "User @{} asked: {}...",
            event.comment.author,
            truncate_chars(&event.comment.body, QUESTION_EXCERPT)
        );
        let notification = templates::pull_request_activity(
            &event.repo,
            pr.number,
            &pr.title,
            "Question Asked",
            &details,
            &pr.html_url,
            Utc::now(),
        );
        notify_or_log(&services.notifier, notification).await;
    }
    Ok(HandlerOutcome::Processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        RecordingGitHub, RecordingNotifier, ScriptedBackend, comment, issue, pull_request,
    };
    use crate::types::{IssueNumber, RepoId};
    use crate::webhooks::events::CommentAction;
    use crate::webhooks::handlers::tests::services;

    fn repo() -> RepoId {
        RepoId::new("octo", "app")
    }

    fn pr_event(action: PrAction, pr: PullRequestRef) -> PullRequestEvent {
        PullRequestEvent {
            repo: repo(),
            action,
            pull_request: pr,
            requested_reviewer: None,
        }
    }

    fn pr_comment(number: u64, author: &str, body: &str) -> IssueCommentEvent {
        let mut on = issue(number);
        on.is_pull_request = true;
        IssueCommentEvent {
            repo: repo(),
            action: CommentAction::Created,
            issue: on,
            comment: comment(author, body, 5),
        }
    }

    #[test]
    fn question_detection() {
        assert!(is_question("Does this break the API?"));
        assert!(is_question("How should I test this"));
        assert!(is_question("  could you rebase"));
        assert!(!is_question("LGTM"));
        assert!(!is_question("Whatever works"));
        assert!(!is_question(""));
    }

    #[test]
    fn pull_request_context_lines() {
        let pr = pull_request(42, "alice");
        assert_eq!(
            pull_request_context(&pr),
            "Pull Request #42: PR 42\n\
             State: open\n\
             Base branch: main\n\
             Head branch: feature\n\
             Description: Adds a feature.\n\
             Files changed: 2\n\
             Additions: +10, Deletions: -3\n\
             Mergeable state: clean"
        );
    }

    #[tokio::test]
    async fn opened_notifies_and_welcomes() {
        let github = RecordingGitHub::new();
        let (backend, notifier) = (ScriptedBackend::default(), RecordingNotifier::new());
        let s = services(&github, &backend, &notifier);

        let outcome = handle_pull_request(&s, &pr_event(PrAction::Opened, pull_request(4, "alice")))
            .await
            .unwrap();

        assert_eq!(outcome, HandlerOutcome::Processed);
        assert_eq!(notifier.subjects(), vec!["PR #4: New Pull Request"]);
        assert!(notifier.sent()[0].html.contains("Opened by @alice from feature to main"));
        assert_eq!(
            github.posted_comments(),
            vec![(IssueNumber(4), welcome_message("alice"))]
        );
    }

    #[tokio::test]
    async fn review_request_only_notifies() {
        let github = RecordingGitHub::new();
        let (backend, notifier) = (ScriptedBackend::default(), RecordingNotifier::new());
        let s = services(&github, &backend, &notifier);
        let mut event = pr_event(PrAction::ReviewRequested, pull_request(4, "alice"));
        event.requested_reviewer = Some("bob".into());

        let outcome = handle_pull_request(&s, &event).await.unwrap();

        assert_eq!(outcome, HandlerOutcome::Processed);
        assert_eq!(notifier.subjects(), vec!["PR #4: Review Requested"]);
        assert!(github.effects().is_empty());
    }

    #[tokio::test]
    async fn merged_congratulates_author() {
        let github = RecordingGitHub::new();
        let (backend, notifier) = (ScriptedBackend::default(), RecordingNotifier::new());
        let s = services(&github, &backend, &notifier);
        let mut pr = pull_request(9, "alice");
        pr.merged = true;
        pr.merged_by = Some("maintainer".into());

        let outcome = handle_pull_request(&s, &pr_event(PrAction::Closed, pr))
            .await
            .unwrap();

        assert_eq!(outcome, HandlerOutcome::Processed);
        assert!(notifier.sent()[0].html.contains("Merged by @maintainer"));
        assert_eq!(
            github.posted_comments(),
            vec![(IssueNumber(9), merged_message("alice"))]
        );
    }

    #[tokio::test]
    async fn closed_without_merge_and_other_actions_are_ignored() {
        let github = RecordingGitHub::new();
        let (backend, notifier) = (ScriptedBackend::default(), RecordingNotifier::new());
        let s = services(&github, &backend, &notifier);

        for action in [PrAction::Closed, PrAction::Other("synchronize".into())] {
            let outcome = handle_pull_request(&s, &pr_event(action, pull_request(9, "alice")))
                .await
                .unwrap();
            assert_eq!(outcome, HandlerOutcome::Ignored);
        }
        assert!(github.effects().is_empty());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn pr_question_is_answered_and_reported() {
        let github = RecordingGitHub::new();
        github.add_pull_request(&repo(), pull_request(6, "alice"));
        let backend = ScriptedBackend::new([Ok("Yes, run the tests first.".to_string())]);
        let notifier = RecordingNotifier::new();
        let s = services(&github, &backend, &notifier);

        let outcome = super::super::handle_issue_comment(
            &s,
            &pr_comment(6, "bob", "Should I run the tests?"),
        )
        .await
        .unwrap();

        assert_eq!(outcome, HandlerOutcome::Processed);
        assert_eq!(
            github.posted_comments(),
            vec![(IssueNumber(6), "Yes, run the tests first.".to_string())]
        );
        assert!(backend.calls()[0].1.starts_with("Pull Request #6: PR 6"));
        assert_eq!(notifier.subjects(), vec!["PR #6: Question Asked"]);
        assert!(notifier.sent()[0].html.contains("User @bob asked: Should I run the tests?..."));
    }

    #[tokio::test]
    async fn pr_remark_is_answered_without_notification() {
        let github = RecordingGitHub::new();
        github.add_pull_request(&repo(), pull_request(6, "alice"));
        let backend = ScriptedBackend::new([Ok("Thanks!".to_string())]);
        let notifier = RecordingNotifier::new();
        let s = services(&github, &backend, &notifier);

        let outcome = handle_pull_request_comment(&s, &pr_comment(6, "bob", "Looks good to me."))
            .await
            .unwrap();

        assert_eq!(outcome, HandlerOutcome::Processed);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn assignment_phrases_on_pull_requests_are_not_arbitrated() {
        let github = RecordingGitHub::new();
        github.add_pull_request(&repo(), pull_request(6, "alice"));
        let backend = ScriptedBackend::new([Ok("Sure.".to_string())]);
        let notifier = RecordingNotifier::new();
        let s = services(&github, &backend, &notifier);

        super::super::handle_issue_comment(&s, &pr_comment(6, "bob", "assign me"))
            .await
            .unwrap();

        assert!(github.assignments().is_empty());
        assert_eq!(github.effect_names()[0], "get_pull_request");
    }
}
