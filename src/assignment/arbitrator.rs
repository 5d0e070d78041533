//! Resolution of competing assignment requests.
//!
//! Arbitration runs only while the issue is unassigned. It scans the whole
//! comment history so earlier unanswered requests compete too, ranks the
//! requesters, and then drives the side effects in a fixed order:
//!
//! 1. assign the winner (a failure here stops everything)
//! 2. confirm to the winner
//! 3. decline each other candidate
//! 4. notify the owner
//!
//! Comment and notification failures in steps 2-4 are logged and skipped.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::effects::{GitHubEffect, GitHubInterpreter};
use crate::notify::{Notifier, notify_or_log, templates};
use crate::types::{CommentRef, IssueRef, RepoId, is_automated_login};

use super::messages;
use super::patterns::is_assignment_request;

/// A user competing for an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCandidate {
    pub username: String,
    /// Every comment the user left on the issue, requests or not.
    pub comment_count: usize,
    /// When the user first asked to be assigned.
    pub earliest_request_time: DateTime<Utc>,
}

/// Ranking order: most comments first, then earliest request, then username.
///
/// The username tie-break makes this a total order even when two candidates
/// share both count and timestamp.
pub fn rank_order(a: &AssignmentCandidate, b: &AssignmentCandidate) -> Ordering {
    b.comment_count
        .cmp(&a.comment_count)
        .then_with(|| a.earliest_request_time.cmp(&b.earliest_request_time))
        .then_with(|| a.username.cmp(&b.username))
}

/// Builds one candidate per distinct requester.
///
/// `is_excluded` filters out authors that may never win (bot accounts).
pub fn collect_candidates(
    comments: &[CommentRef],
    is_excluded: impl Fn(&str) -> bool,
) -> Vec<AssignmentCandidate> {
    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    let mut first_request: BTreeMap<&str, DateTime<Utc>> = BTreeMap::new();

    for comment in comments {
        *totals.entry(comment.author.as_str()).or_default() += 1;

        if is_assignment_request(&comment.body) && !is_excluded(&comment.author) {
            first_request
                .entry(comment.author.as_str())
                .and_modify(|t| *t = (*t).min(comment.created_at))
                .or_insert(comment.created_at);
        }
    }

    first_request
        .into_iter()
        .map(|(username, earliest_request_time)| AssignmentCandidate {
            username: username.to_string(),
            comment_count: totals.get(username).copied().unwrap_or(0),
            earliest_request_time,
        })
        .collect()
}

/// Sorts candidates into rank order; index 0 wins.
pub fn rank_candidates(mut candidates: Vec<AssignmentCandidate>) -> Vec<AssignmentCandidate> {
    candidates.sort_by(rank_order);
    candidates
}

/// What arbitration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbitrationOutcome {
    /// The issue already had an assignee; nothing was called.
    AlreadyAssigned,

    /// No comment on the issue asks for assignment.
    NoCandidates,

    /// The assign call failed; no comments were posted.
    AssignFailed { winner: String, error: String },

    /// The winner was assigned and everyone was told.
    Assigned { winner: String, declined: Vec<String> },
}

impl ArbitrationOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, ArbitrationOutcome::Assigned { .. })
    }
}

/// Everything arbitration needs to know about the issue.
#[derive(Debug, Clone, Copy)]
pub struct ArbitrationInput<'a> {
    pub repo: &'a RepoId,
    /// A fresh view of the issue (assignees must be current).
    pub issue: &'a IssueRef,
    /// The issue's full comment history.
    pub comments: &'a [CommentRef],
    /// The login the service posts as.
    pub bot_login: &'a str,
}

/// Runs arbitration and its side effects.
pub async fn arbitrate<G, N>(
    github: &G,
    notifier: &N,
    input: ArbitrationInput<'_>,
) -> ArbitrationOutcome
where
    G: GitHubInterpreter,
    N: Notifier,
{
    let ArbitrationInput {
        repo,
        issue,
        comments,
        bot_login,
    } = input;

    if issue.is_assigned() {
        tracing::info!(
            repo = %repo,
            issue = issue.number.0,
            assignees = ?issue.assignees,
            "Issue already assigned; skipping arbitration"
        );
        return ArbitrationOutcome::AlreadyAssigned;
    }

    let candidates = collect_candidates(comments, |author| is_automated_login(author, bot_login));
    let mut ranked = rank_candidates(candidates).into_iter();
    let Some(winner) = ranked.next() else {
        tracing::debug!(repo = %repo, issue = issue.number.0, "No assignment requests found");
        return ArbitrationOutcome::NoCandidates;
    };
    let others: Vec<AssignmentCandidate> = ranked.collect();

    tracing::info!(
        repo = %repo,
        issue = issue.number.0,
        winner = %winner.username,
        winner_comments = winner.comment_count,
        candidates = others.len() + 1,
        "Selected assignee"
    );

    // 1. Assign. Nothing else happens unless this succeeds.
    let assigned = github
        .interpret(GitHubEffect::AddAssignee {
            repo: repo.clone(),
            issue: issue.number,
            login: winner.username.clone(),
        })
        .await;
    if let Err(e) = assigned {
        tracing::error!(
            repo = %repo,
            issue = issue.number.0,
            winner = %winner.username,
            error = %e,
            "Failed to assign issue; aborting arbitration"
        );
        return ArbitrationOutcome::AssignFailed {
            winner: winner.username,
            error: e.to_string(),
        };
    }

    // 2. Confirm.
    post_comment(github, repo, issue, messages::confirmation(&winner.username)).await;

    // 3. Decline the rest, one comment each.
    for other in &others {
        post_comment(
            github,
            repo,
            issue,
            messages::decline(&other.username, &winner.username),
        )
        .await;
    }

    // 4. Tell the owner.
    let declined: Vec<String> = others.into_iter().map(|c| c.username).collect();
    notify_or_log(
        notifier,
        templates::issue_assignment(
            repo,
            issue.number,
            &issue.title,
            &winner.username,
            &declined,
            &issue.html_url,
            Utc::now(),
        ),
    )
    .await;

    ArbitrationOutcome::Assigned {
        winner: winner.username,
        declined,
    }
}

async fn post_comment<G: GitHubInterpreter>(github: &G, repo: &RepoId, issue: &IssueRef, body: String) {
    let result = github
        .interpret(GitHubEffect::PostComment {
            repo: repo.clone(),
            issue: issue.number,
            body,
        })
        .await;
    if let Err(e) = result {
        tracing::error!(repo = %repo, issue = issue.number.0, error = %e, "Failed to post comment");
    }
}
