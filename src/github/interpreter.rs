//! GitHub effect interpreter using octocrab.
//!
//! Every effect is a plain REST call made through octocrab's raw `get`/`post`
//! (and `_delete`) helpers and deserialized into the small response structs below, which are
//! then lowered into the domain types in [`crate::types`].
//!
//! Transient failures are retried with exponential backoff; everything else
//! is returned to the caller as a permanent [`GitHubApiError`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::retry::retry_with_backoff;
use crate::types::{
    CommentId, CommentRef, HookId, HookSpec, IssueNumber, IssueRef, IssueState, PullRequestRef,
    RateLimitWindow, RepoHook, RepoId,
};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

/// Page size for paginated listings.
const PER_PAGE: u8 = 100;

impl GitHubInterpreter for OctocrabClient {
    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        interpret_github_effect(self, effect).await
    }
}

/// Interprets a GitHub effect with the client's retry settings.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    let name = effect.name();
    let mutation = effect.is_mutation();
    let result = retry_with_backoff(client.retry_config(), || {
        execute_effect(client, effect.clone())
    })
    .await
    .into_result();

    if let Err(e) = &result {
        tracing::warn!(effect = name, mutation, error = %e, "GitHub call failed");
    }
    result
}

/// Executes a single effect without retry logic.
async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetIssue { repo, issue } => get_issue(client, &repo, issue).await,
        GitHubEffect::GetPullRequest { repo, pr } => get_pull_request(client, &repo, pr).await,
        GitHubEffect::ListIssueComments { repo, issue } => {
            list_issue_comments(client, &repo, issue).await
        }
        GitHubEffect::ListRecentIssues { repo, limit } => {
            list_recent_issues(client, &repo, limit).await
        }
        GitHubEffect::PostComment { repo, issue, body } => {
            post_comment(client, &repo, issue, body).await
        }
        GitHubEffect::AddAssignee { repo, issue, login } => {
            add_assignee(client, &repo, issue, login).await
        }
        GitHubEffect::ListHooks { repo } => list_hooks(client, &repo).await,
        GitHubEffect::CreateHook { repo, spec } => create_hook(client, &repo, spec).await,
        GitHubEffect::DeleteHook { repo, id } => delete_hook(client, &repo, id).await,
        GitHubEffect::GetRateLimit => get_rate_limit(client).await,
        GitHubEffect::ListPublicRepos => list_public_repos(client).await,
        GitHubEffect::GetAuthenticatedUser => get_authenticated_user(client).await,
    }
}

// ─── Response shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    state: String,
    body: Option<String>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    user: Option<ApiUser>,
    #[serde(default)]
    assignees: Vec<ApiUser>,
    #[serde(default)]
    html_url: String,
    updated_at: Option<DateTime<Utc>>,
    pull_request: Option<serde_json::Value>,
}

impl From<ApiIssue> for IssueRef {
    fn from(issue: ApiIssue) -> Self {
        IssueRef {
            number: IssueNumber(issue.number),
            title: issue.title,
            state: IssueState::from_api(&issue.state),
            body: issue.body,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            author: issue.user.map(|u| u.login).unwrap_or_default(),
            assignees: issue.assignees.into_iter().map(|u| u.login).collect(),
            html_url: issue.html_url,
            updated_at: issue.updated_at,
            is_pull_request: issue.pull_request.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiBranchRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    state: String,
    body: Option<String>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    user: Option<ApiUser>,
    head: ApiBranchRef,
    base: ApiBranchRef,
    #[serde(default)]
    changed_files: u64,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    mergeable_state: Option<String>,
    #[serde(default)]
    merged: bool,
    merged_by: Option<ApiUser>,
    #[serde(default)]
    html_url: String,
}

impl From<ApiPullRequest> for PullRequestRef {
    fn from(pr: ApiPullRequest) -> Self {
        PullRequestRef {
            number: IssueNumber(pr.number),
            title: pr.title,
            state: IssueState::from_api(&pr.state),
            body: pr.body,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            author: pr.user.map(|u| u.login).unwrap_or_default(),
            base_ref: pr.base.ref_name,
            head_ref: pr.head.ref_name,
            changed_files: pr.changed_files,
            additions: pr.additions,
            deletions: pr.deletions,
            mergeable_state: pr.mergeable_state,
            merged: pr.merged,
            merged_by: pr.merged_by.map(|u| u.login),
            html_url: pr.html_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiComment {
    id: u64,
    body: Option<String>,
    // Deleted accounts come back as null
    user: Option<ApiUser>,
    created_at: DateTime<Utc>,
}

impl From<ApiComment> for CommentRef {
    fn from(comment: ApiComment) -> Self {
        CommentRef {
            body: comment.body.unwrap_or_default(),
            author: comment
                .user
                .map(|u| u.login)
                .unwrap_or_else(|| "ghost".to_string()),
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRateLimit {
    resources: ApiRateResources,
}

#[derive(Debug, Deserialize)]
struct ApiRateResources {
    core: ApiRate,
}

#[derive(Debug, Deserialize)]
struct ApiRate {
    limit: u64,
    remaining: u64,
    /// Unix epoch seconds.
    reset: i64,
}

impl TryFrom<ApiRateLimit> for RateLimitWindow {
    type Error = GitHubApiError;

    fn try_from(raw: ApiRateLimit) -> Result<Self, Self::Error> {
        let core = raw.resources.core;
        let reset_at = DateTime::from_timestamp(core.reset, 0).ok_or_else(|| {
            GitHubApiError::permanent(format!("invalid rate-limit reset time {}", core.reset))
        })?;
        Ok(RateLimitWindow {
            remaining: core.remaining,
            limit: core.limit,
            reset_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiRepo {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiHook {
    id: u64,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    events: Vec<String>,
    #[serde(default)]
    config: ApiHookConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ApiHookConfig {
    url: Option<String>,
}

impl From<ApiHook> for RepoHook {
    fn from(hook: ApiHook) -> Self {
        RepoHook {
            id: HookId(hook.id),
            url: hook.config.url,
            active: hook.active,
            events: hook.events,
        }
    }
}

#[derive(Debug, Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

// ─── Issues and pull requests ─────────────────────────────────────────────────

async fn get_issue(
    client: &OctocrabClient,
    repo: &RepoId,
    issue: IssueNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/issues/{}", repo.owner, repo.repo, issue.0);
    let result: Result<ApiIssue, _> = client.inner().get(&url, None::<&()>).await;

    match result {
        Ok(raw) => Ok(GitHubResponse::Issue(raw.into())),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn get_pull_request(
    client: &OctocrabClient,
    repo: &RepoId,
    pr: IssueNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/pulls/{}", repo.owner, repo.repo, pr.0);
    let result: Result<ApiPullRequest, _> = client.inner().get(&url, None::<&()>).await;

    match result {
        Ok(raw) => Ok(GitHubResponse::PullRequest(raw.into())),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

/// Fetches pages 1, 2, ... until one comes back short. No page cap: the
/// arbitrator must see every comment on the thread.
async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, GitHubApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<T>, GitHubApiError>>,
{
    let mut page = 1u32;
    let mut all = Vec::new();
    loop {
        let items = fetch(page).await?;
        let is_last_page = items.len() < usize::from(PER_PAGE);
        all.extend(items);
        if is_last_page {
            return Ok(all);
        }
        page += 1;
    }
}

async fn list_issue_comments(
    client: &OctocrabClient,
    repo: &RepoId,
    issue: IssueNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/issues/{}/comments",
        repo.owner, repo.repo, issue.0
    );
    let comments = collect_pages(|page| {
        let url = &url;
        async move {
            let params = PageParams {
                per_page: PER_PAGE,
                page,
            };
            let items: Vec<ApiComment> = client
                .inner()
                .get(url, Some(&params))
                .await
                .map_err(GitHubApiError::from_octocrab)?;
            Ok(items.into_iter().map(CommentRef::from).collect())
        }
    })
    .await?;

    Ok(GitHubResponse::Comments(comments))
}

async fn list_recent_issues(
    client: &OctocrabClient,
    repo: &RepoId,
    limit: u8,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct Params {
        state: &'static str,
        sort: &'static str,
        direction: &'static str,
        per_page: u8,
    }

    let url = format!("/repos/{}/{}/issues", repo.owner, repo.repo);
    let params = Params {
        state: "all",
        sort: "updated",
        direction: "desc",
        per_page: limit.clamp(1, PER_PAGE),
    };
    let result: Result<Vec<ApiIssue>, _> = client.inner().get(&url, Some(&params)).await;

    match result {
        Ok(items) => Ok(GitHubResponse::Issues(
            items
                .into_iter()
                .take(usize::from(limit))
                .map(IssueRef::from)
                .collect(),
        )),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

// ─── Mutations ────────────────────────────────────────────────────────────────

async fn post_comment(
    client: &OctocrabClient,
    repo: &RepoId,
    issue: IssueNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct CommentRequest {
        body: String,
    }

    let url = format!(
        "/repos/{}/{}/issues/{}/comments",
        repo.owner, repo.repo, issue.0
    );
    let result: Result<ApiComment, _> = client
        .inner()
        .post(&url, Some(&CommentRequest { body }))
        .await;

    match result {
        Ok(comment) => Ok(GitHubResponse::CommentPosted {
            id: CommentId(comment.id),
        }),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn add_assignee(
    client: &OctocrabClient,
    repo: &RepoId,
    issue: IssueNumber,
    login: String,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct AssigneesRequest<'a> {
        assignees: [&'a str; 1],
    }

    let url = format!(
        "/repos/{}/{}/issues/{}/assignees",
        repo.owner, repo.repo, issue.0
    );
    let result: Result<ApiIssue, _> = client
        .inner()
        .post(
            &url,
            Some(&AssigneesRequest {
                assignees: [login.as_str()],
            }),
        )
        .await;

    match result {
        Ok(updated) => confirm_assignment(updated.into(), &login),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

/// GitHub answers 201 even when it silently drops an assignee it will not
/// accept (e.g. a user without triage access), so the returned issue is the
/// only evidence the call did anything.
fn confirm_assignment(updated: IssueRef, login: &str) -> Result<GitHubResponse, GitHubApiError> {
    if updated
        .assignees
        .iter()
        .any(|a| a.eq_ignore_ascii_case(login))
    {
        Ok(GitHubResponse::AssigneeAdded)
    } else {
        Err(GitHubApiError::permanent(format!(
            "{login} was not accepted as an assignee of {}",
            updated.number
        )))
    }
}

// ─── Repository hooks ─────────────────────────────────────────────────────────

async fn list_hooks(client: &OctocrabClient, repo: &RepoId) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/hooks", repo.owner, repo.repo);
    let hooks = collect_pages(|page| {
        let url = &url;
        async move {
            let params = PageParams {
                per_page: PER_PAGE,
                page,
            };
            client
                .inner()
                .get::<Vec<ApiHook>, _, _>(url, Some(&params))
                .await
                .map_err(GitHubApiError::from_octocrab)
        }
    })
    .await?;

    Ok(GitHubResponse::Hooks(hooks.into_iter().map(RepoHook::from).collect()))
}

async fn create_hook(
    client: &OctocrabClient,
    repo: &RepoId,
    spec: HookSpec,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/hooks", repo.owner, repo.repo);
    let result: Result<ApiHook, _> = client.inner().post(&url, Some(&hook_request(&spec))).await;

    match result {
        Ok(hook) => Ok(GitHubResponse::HookCreated { id: HookId(hook.id) }),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

/// Body of `POST /repos/{owner}/{repo}/hooks`.
fn hook_request(spec: &HookSpec) -> serde_json::Value {
    serde_json::json!({
        "name": "web",
        "active": true,
        "events": spec.events,
        "config": {
            "url": spec.url,
            "content_type": "json",
            "secret": spec.secret,
            "insecure_ssl": "0",
        },
    })
}

async fn delete_hook(
    client: &OctocrabClient,
    repo: &RepoId,
    id: HookId,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/hooks/{}", repo.owner, repo.repo, id.0);
    // 204 with an empty body, so the typed helpers cannot be used.
    let response = client
        .inner()
        ._delete(url.as_str(), None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    octocrab::map_github_error(response)
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::HookDeleted)
}

// ─── Account ──────────────────────────────────────────────────────────────────

async fn get_rate_limit(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let result: Result<ApiRateLimit, _> = client.inner().get("/rate_limit", None::<&()>).await;

    match result {
        Ok(raw) => Ok(GitHubResponse::RateLimit(raw.try_into()?)),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn list_public_repos(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct Params {
        visibility: &'static str,
        per_page: u8,
        page: u32,
    }

    let items = collect_pages(|page| async move {
        let params = Params {
            visibility: "public",
            per_page: PER_PAGE,
            page,
        };
        client
            .inner()
            .get::<Vec<ApiRepo>, _, _>("/user/repos", Some(&params))
            .await
            .map_err(GitHubApiError::from_octocrab)
    })
    .await?;

    let repos = items
        .into_iter()
        .filter_map(|item| match RepoId::parse_full_name(&item.full_name) {
            Ok(repo) => Some(repo),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping repository");
                None
            }
        })
        .collect();
    Ok(GitHubResponse::Repos(repos))
}

async fn get_authenticated_user(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let result: Result<ApiUser, _> = client.inner().get("/user", None::<&()>).await;

    match result {
        Ok(user) => Ok(GitHubResponse::User { login: user.login }),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}
