//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The interpreter in [`crate::github`] executes them against the REST API;
//! tests execute them against a recording mock.

use serde::{Deserialize, Serialize};

use crate::types::{
    CommentId, CommentRef, HookId, HookSpec, IssueNumber, IssueRef, PullRequestRef,
    RateLimitWindow, RepoHook, RepoId,
};

/// A GitHub API effect.
///
/// The steward serves every repository its token can see, so repo-scoped
/// effects name their repository explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Issue / PR queries ───────────────────────────────────────────────────
    /// Fetch a single issue (fresh assignees included).
    GetIssue { repo: RepoId, issue: IssueNumber },

    /// Fetch a single pull request.
    GetPullRequest { repo: RepoId, pr: IssueNumber },

    /// List every comment on an issue or PR conversation, oldest first.
    ListIssueComments { repo: RepoId, issue: IssueNumber },

    /// List the most recently updated issues (any state, PRs included).
    ListRecentIssues { repo: RepoId, limit: u8 },

    // ─── Mutations ────────────────────────────────────────────────────────────
    /// Post a new comment on an issue or PR.
    PostComment {
        repo: RepoId,
        issue: IssueNumber,
        body: String,
    },

    /// Add a single assignee to an issue.
    AddAssignee {
        repo: RepoId,
        issue: IssueNumber,
        login: String,
    },

    // ─── Repository hooks ─────────────────────────────────────────────────────
    /// List every hook configured on a repository.
    ListHooks { repo: RepoId },

    /// Create a web hook.
    CreateHook { repo: RepoId, spec: HookSpec },

    DeleteHook { repo: RepoId, id: HookId },

    // ─── Account ──────────────────────────────────────────────────────────────
    /// Query the core REST rate-limit window.
    GetRateLimit,

    /// List the authenticated account's public repositories.
    ListPublicRepos,

    /// Resolve the login the token acts as.
    GetAuthenticatedUser,
}

impl GitHubEffect {
    /// Returns true for effects that change state on GitHub.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            GitHubEffect::PostComment { .. }
                | GitHubEffect::AddAssignee { .. }
                | GitHubEffect::CreateHook { .. }
                | GitHubEffect::DeleteHook { .. }
        )
    }

    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::GetIssue { .. } => "get_issue",
            GitHubEffect::GetPullRequest { .. } => "get_pull_request",
            GitHubEffect::ListIssueComments { .. } => "list_issue_comments",
            GitHubEffect::ListRecentIssues { .. } => "list_recent_issues",
            GitHubEffect::PostComment { .. } => "post_comment",
            GitHubEffect::AddAssignee { .. } => "add_assignee",
            GitHubEffect::ListHooks { .. } => "list_hooks",
            GitHubEffect::CreateHook { .. } => "create_hook",
            GitHubEffect::DeleteHook { .. } => "delete_hook",
            GitHubEffect::GetRateLimit => "get_rate_limit",
            GitHubEffect::ListPublicRepos => "list_public_repos",
            GitHubEffect::GetAuthenticatedUser => "get_authenticated_user",
        }
    }
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetIssue`.
    Issue(IssueRef),

    /// Response to `GetPullRequest`.
    PullRequest(PullRequestRef),

    /// Response to `ListIssueComments`.
    Comments(Vec<CommentRef>),

    /// Response to `ListRecentIssues`.
    Issues(Vec<IssueRef>),

    /// Response to `PostComment`.
    CommentPosted { id: CommentId },

    /// Response to `AddAssignee`.
    AssigneeAdded,

    /// Response to `ListHooks`.
    Hooks(Vec<RepoHook>),

    /// Response to `CreateHook`.
    HookCreated { id: HookId },

    /// Response to `DeleteHook`.
    HookDeleted,

    /// Response to `GetRateLimit`.
    RateLimit(RateLimitWindow),

    /// Response to `ListPublicRepos`.
    Repos(Vec<RepoId>),

    /// Response to `GetAuthenticatedUser`.
    User { login: String },
}
