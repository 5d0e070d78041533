//! Shared test doubles and fixtures.
//!
//! The doubles are cheap to clone; clones share state, so a test can hand one
//! clone to the code under test and inspect another.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::generation::{GenerationError, TextBackend};
use crate::github::GitHubApiError;
use crate::notify::{Notification, Notifier, NotifyError};
use crate::types::{
    CommentId, CommentRef, HookId, IssueNumber, IssueRef, IssueState, PullRequestRef,
    RateLimitWindow, RepoHook, RepoId,
};

// ─── Fixtures ─────────────────────────────────────────────────────────────────

/// A fixed instant `minutes` after 2024-01-01T00:00:00Z.
pub fn at_minute(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid base timestamp")
        + chrono::Duration::minutes(minutes)
}

pub fn comment(author: &str, body: &str, minute: i64) -> CommentRef {
    CommentRef::new(body, author, at_minute(minute))
}

/// An open, unassigned issue.
pub fn issue(number: u64) -> IssueRef {
    IssueRef {
        number: IssueNumber(number),
        title: format!("Issue {number}"),
        state: IssueState::Open,
        body: Some("Something is wrong.".to_string()),
        labels: vec![],
        author: "reporter".to_string(),
        assignees: vec![],
        html_url: format!("https://github.com/octo/app/issues/{number}"),
        updated_at: Some(at_minute(0)),
        is_pull_request: false,
    }
}

/// An open pull request from `feature` into `main`.
pub fn pull_request(number: u64, author: &str) -> PullRequestRef {
    PullRequestRef {
        number: IssueNumber(number),
        title: format!("PR {number}"),
        state: IssueState::Open,
        body: Some("Adds a feature.".to_string()),
        labels: vec![],
        author: author.to_string(),
        base_ref: "main".to_string(),
        head_ref: "feature".to_string(),
        changed_files: 2,
        additions: 10,
        deletions: 3,
        mergeable_state: Some("clean".to_string()),
        merged: false,
        merged_by: None,
        html_url: format!("https://github.com/octo/app/pull/{number}"),
    }
}

// ─── RecordingGitHub ──────────────────────────────────────────────────────────

struct Fixture {
    login: String,
    repos: Vec<RepoId>,
    issues: HashMap<(RepoId, IssueNumber), IssueRef>,
    pull_requests: HashMap<(RepoId, IssueNumber), PullRequestRef>,
    comments: HashMap<(RepoId, IssueNumber), Vec<CommentRef>>,
    recent: HashMap<RepoId, Vec<IssueRef>>,
    hooks: HashMap<RepoId, Vec<RepoHook>>,
    /// Remaining quota and reset offset from the time of the query.
    rate_limit: (u64, chrono::Duration),
    rate_limit_fails: bool,
    failing: HashSet<String>,
    /// Effects that fail only for one repository, as a missing admin right would.
    forbidden: HashSet<(RepoId, String)>,
    effects: Vec<GitHubEffect>,
    next_comment_id: u64,
    next_hook_id: u64,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            login: "steward-bot".to_string(),
            repos: vec![],
            issues: HashMap::new(),
            pull_requests: HashMap::new(),
            comments: HashMap::new(),
            recent: HashMap::new(),
            hooks: HashMap::new(),
            rate_limit: (5000, chrono::Duration::hours(1)),
            rate_limit_fails: false,
            failing: HashSet::new(),
            forbidden: HashSet::new(),
            effects: vec![],
            next_comment_id: 1,
            next_hook_id: 100,
        }
    }
}

/// In-memory GitHub that records every effect it is asked to perform.
#[derive(Clone, Default)]
pub struct RecordingGitHub {
    fixture: Arc<Mutex<Fixture>>,
}

impl RecordingGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Fixture) -> R) -> R {
        let mut guard = self.fixture.lock().unwrap();
        f(&mut guard)
    }

    pub fn set_login(&self, login: &str) {
        self.with(|f| f.login = login.to_string());
    }

    pub fn set_repos(&self, repos: Vec<RepoId>) {
        self.with(|f| f.repos = repos);
    }

    pub fn add_issue(&self, repo: &RepoId, issue: IssueRef) {
        self.with(|f| f.issues.insert((repo.clone(), issue.number), issue));
    }

    pub fn add_pull_request(&self, repo: &RepoId, pr: PullRequestRef) {
        self.with(|f| f.pull_requests.insert((repo.clone(), pr.number), pr));
    }

    pub fn set_comments(&self, repo: &RepoId, issue: IssueNumber, comments: Vec<CommentRef>) {
        self.with(|f| f.comments.insert((repo.clone(), issue), comments));
    }

    pub fn set_recent_issues(&self, repo: &RepoId, issues: Vec<IssueRef>) {
        self.with(|f| f.recent.insert(repo.clone(), issues));
    }

    pub fn set_hooks(&self, repo: &RepoId, hooks: Vec<RepoHook>) {
        self.with(|f| f.hooks.insert(repo.clone(), hooks));
    }

    /// Hooks currently configured on `repo`, creations and deletions applied.
    pub fn hooks(&self, repo: &RepoId) -> Vec<RepoHook> {
        self.with(|f| f.hooks.get(repo).cloned().unwrap_or_default())
    }

    /// Sets the quota reported by `get_rate_limit`; reset is `reset_in` from
    /// the moment of each query.
    pub fn set_rate_limit(&self, remaining: u64, reset_in: chrono::Duration) {
        self.with(|f| f.rate_limit = (remaining, reset_in));
    }

    pub fn fail_rate_limit(&self) {
        self.fail("get_rate_limit");
    }

    /// Makes every effect with this name fail (it is still recorded).
    pub fn fail(&self, effect_name: &str) {
        self.with(|f| f.failing.insert(effect_name.to_string()));
    }

    /// Makes `effect_name` fail permanently, for `repo` only.
    pub fn forbid(&self, repo: &RepoId, effect_name: &str) {
        self.with(|f| f.forbidden.insert((repo.clone(), effect_name.to_string())));
    }

    pub fn effects(&self) -> Vec<GitHubEffect> {
        self.with(|f| f.effects.clone())
    }

    pub fn effect_names(&self) -> Vec<&'static str> {
        self.with(|f| f.effects.iter().map(GitHubEffect::name).collect())
    }

    /// Every attempted comment, in order.
    pub fn posted_comments(&self) -> Vec<(IssueNumber, String)> {
        self.with(|f| {
            f.effects
                .iter()
                .filter_map(|e| match e {
                    GitHubEffect::PostComment { issue, body, .. } => Some((*issue, body.clone())),
                    _ => None,
                })
                .collect()
        })
    }

    /// Every attempted assignment, in order.
    pub fn assignments(&self) -> Vec<(IssueNumber, String)> {
        self.with(|f| {
            f.effects
                .iter()
                .filter_map(|e| match e {
                    GitHubEffect::AddAssignee { issue, login, .. } => Some((*issue, login.clone())),
                    _ => None,
                })
                .collect()
        })
    }

    fn respond(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        self.with(|f| {
            f.effects.push(effect.clone());
            if f.failing.contains(effect.name()) {
                return Err(GitHubApiError::transient(format!(
                    "{} failed (test)",
                    effect.name()
                )));
            }
            let forbidden = effect_repo(&effect)
                .is_some_and(|repo| f.forbidden.contains(&(repo.clone(), effect.name().to_string())));
            if forbidden {
                return Err(GitHubApiError::permanent(
                    "Must have admin rights to Repository.",
                ));
            }

            match effect {
                GitHubEffect::GetIssue { repo, issue } => f
                    .issues
                    .get(&(repo, issue))
                    .cloned()
                    .map(GitHubResponse::Issue)
                    .ok_or_else(|| GitHubApiError::permanent(format!("no issue {issue}"))),
                GitHubEffect::GetPullRequest { repo, pr } => f
                    .pull_requests
                    .get(&(repo, pr))
                    .cloned()
                    .map(GitHubResponse::PullRequest)
                    .ok_or_else(|| GitHubApiError::permanent(format!("no pull request {pr}"))),
                GitHubEffect::ListIssueComments { repo, issue } => Ok(GitHubResponse::Comments(
                    f.comments.get(&(repo, issue)).cloned().unwrap_or_default(),
                )),
                GitHubEffect::ListRecentIssues { repo, limit } => Ok(GitHubResponse::Issues(
                    f.recent
                        .get(&repo)
                        .map(|issues| issues.iter().take(limit as usize).cloned().collect())
                        .unwrap_or_default(),
                )),
                GitHubEffect::PostComment { .. } => {
                    let id = CommentId(f.next_comment_id);
                    f.next_comment_id += 1;
                    Ok(GitHubResponse::CommentPosted { id })
                }
                GitHubEffect::AddAssignee { repo, issue, login } => {
                    if let Some(stored) = f.issues.get_mut(&(repo, issue)) {
                        stored.assignees.push(login);
                    }
                    Ok(GitHubResponse::AssigneeAdded)
                }
                GitHubEffect::ListHooks { repo } => Ok(GitHubResponse::Hooks(
                    f.hooks.get(&repo).cloned().unwrap_or_default(),
                )),
                GitHubEffect::CreateHook { repo, spec } => {
                    let id = HookId(f.next_hook_id);
                    f.next_hook_id += 1;
                    f.hooks.entry(repo).or_default().push(RepoHook {
                        id,
                        url: Some(spec.url),
                        active: true,
                        events: spec.events,
                    });
                    Ok(GitHubResponse::HookCreated { id })
                }
                GitHubEffect::DeleteHook { repo, id } => {
                    let hooks = f.hooks.entry(repo).or_default();
                    let before = hooks.len();
                    hooks.retain(|h| h.id != id);
                    if hooks.len() == before {
                        Err(GitHubApiError::permanent(format!("no hook {id}")))
                    } else {
                        Ok(GitHubResponse::HookDeleted)
                    }
                }
                GitHubEffect::GetRateLimit => {
                    let (remaining, reset_in) = f.rate_limit;
                    Ok(GitHubResponse::RateLimit(RateLimitWindow {
                        remaining,
                        limit: 5000,
                        reset_at: Utc::now() + reset_in,
                    }))
                }
                GitHubEffect::ListPublicRepos => Ok(GitHubResponse::Repos(f.repos.clone())),
                GitHubEffect::GetAuthenticatedUser => Ok(GitHubResponse::User {
                    login: f.login.clone(),
                }),
            }
        })
    }
}

fn effect_repo(effect: &GitHubEffect) -> Option<&RepoId> {
    match effect {
        GitHubEffect::GetIssue { repo, .. }
        | GitHubEffect::GetPullRequest { repo, .. }
        | GitHubEffect::ListIssueComments { repo, .. }
        | GitHubEffect::ListRecentIssues { repo, .. }
        | GitHubEffect::PostComment { repo, .. }
        | GitHubEffect::AddAssignee { repo, .. }
        | GitHubEffect::ListHooks { repo }
        | GitHubEffect::CreateHook { repo, .. }
        | GitHubEffect::DeleteHook { repo, .. } => Some(repo),
        GitHubEffect::GetRateLimit
        | GitHubEffect::ListPublicRepos
        | GitHubEffect::GetAuthenticatedUser => None,
    }
}

impl GitHubInterpreter for RecordingGitHub {
    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        self.respond(effect)
    }
}

// ─── ScriptedBackend ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<String, GenerationError>>,
    fail_always: bool,
    calls: Vec<(String, String)>,
}

/// Text backend that replays scripted replies and records its inputs.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = Result<String, GenerationError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                replies: replies.into_iter().collect(),
                ..Script::default()
            })),
        }
    }

    /// Every call fails with a retriable error, ignoring the script.
    pub fn fail_always(&self) {
        self.script.lock().unwrap().fail_always = true;
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.script.lock().unwrap().calls.clone()
    }
}

impl TextBackend for ScriptedBackend {
    async fn complete(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push((prompt.to_string(), context.to_string()));
        if script.fail_always {
            return Err(GenerationError::HttpStatus {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::InvalidResponse("script exhausted".into())))
    }
}

// ─── RecordingNotifier ────────────────────────────────────────────────────────

#[derive(Default)]
struct Outbox {
    sent: Vec<Notification>,
    failing: bool,
}

/// Notifier that keeps every notification it is given.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    outbox: Arc<Mutex<Outbox>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records notifications but reports delivery failure.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.outbox.lock().unwrap().failing = true;
        notifier
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.outbox.lock().unwrap().sent.clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.subject).collect()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let mut outbox = self.outbox.lock().unwrap();
        outbox.sent.push(notification);
        if outbox.failing {
            return Err(NotifyError::Rejected {
                status: 500,
                body: "test".to_string(),
            });
        }
        Ok(())
    }
}
