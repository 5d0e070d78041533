//! Core domain types for the repository steward.
//!
//! Identifiers plus the issue/PR/comment snapshots that flow from the webhook
//! and GitHub API layers into the handlers, and the repository hooks managed
//! by the `hooks` subcommand.

pub mod hook;
pub mod ids;
pub mod issue;
pub mod rate_limit;

pub use hook::{HOOK_EVENTS, HookId, HookSpec, RepoHook};
pub use ids::{CommentId, InvalidRepoName, IssueNumber, RepoId};
pub use issue::{CommentRef, IssueRef, IssueState, PullRequestRef, is_automated_login};
pub use rate_limit::RateLimitWindow;
