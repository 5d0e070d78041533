//! Bulk management of this service's webhook.
//!
//! One process answers deliveries from every repository the token can reach,
//! so each of the account's public repositories needs a hook pointing at it.
//! The operations here take the repository list up front, so the caller can
//! confirm with the user before anything changes. A failure on one
//! repository (typically a missing admin right) is recorded and the run
//! continues.

use std::fmt;

use thiserror::Error;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::GitHubApiError;
use crate::types::{HookId, HookSpec, RepoHook, RepoId};

#[derive(Debug, Error)]
pub enum HooksError {
    #[error("listing repositories failed: {0}")]
    ListRepos(#[source] GitHubApiError),

    #[error("unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}

/// Outcome of [`install_hooks`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub added: Vec<RepoId>,
    pub already_present: Vec<RepoId>,
    pub failed: Vec<(RepoId, String)>,
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Added: {}", self.added.len())?;
        writeln!(f, "Already present: {}", self.already_present.len())?;
        write!(f, "Errors: {}", self.failed.len())?;
        for (repo, reason) in &self.failed {
            write!(f, "\n  {repo}: {reason}")?;
        }
        Ok(())
    }
}

/// The hooks of one repository that has any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookListing {
    pub repo: RepoId,
    pub hooks: Vec<RepoHook>,
}

/// Outcome of [`remove_hooks`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: Vec<(RepoId, HookId)>,
    pub failed: Vec<(RepoId, String)>,
}

/// Public repositories of the account the token acts as.
pub async fn public_repos<G: GitHubInterpreter>(github: &G) -> Result<Vec<RepoId>, HooksError> {
    match github.interpret(GitHubEffect::ListPublicRepos).await {
        Ok(GitHubResponse::Repos(repos)) => Ok(repos),
        Ok(_) => Err(HooksError::UnexpectedResponse("list_public_repos")),
        Err(e) => Err(HooksError::ListRepos(e)),
    }
}

async fn repo_hooks<G: GitHubInterpreter>(
    github: &G,
    repo: &RepoId,
) -> Result<Vec<RepoHook>, GitHubApiError> {
    match github
        .interpret(GitHubEffect::ListHooks { repo: repo.clone() })
        .await?
    {
        GitHubResponse::Hooks(hooks) => Ok(hooks),
        other => Err(GitHubApiError::permanent(format!(
            "unexpected response to list_hooks: {other:?}"
        ))),
    }
}

/// Creates `spec` on every repository that has no hook delivering to its URL.
pub async fn install_hooks<G: GitHubInterpreter>(
    github: &G,
    repos: &[RepoId],
    spec: &HookSpec,
) -> InstallReport {
    let mut report = InstallReport::default();

    for (i, repo) in repos.iter().enumerate() {
        let result = async {
            let existing = repo_hooks(github, repo).await?;
            if existing.iter().any(|h| h.delivers_to(&spec.url)) {
                return Ok(false);
            }
            github
                .interpret(GitHubEffect::CreateHook {
                    repo: repo.clone(),
                    spec: spec.clone(),
                })
                .await?;
            Ok::<_, GitHubApiError>(true)
        }
        .await;

        match result {
            Ok(true) => {
                tracing::info!(repo = %repo, progress = i + 1, total = repos.len(), "Webhook added");
                report.added.push(repo.clone());
            }
            Ok(false) => {
                tracing::info!(repo = %repo, progress = i + 1, total = repos.len(), "Webhook already exists");
                report.already_present.push(repo.clone());
            }
            Err(e) => {
                tracing::warn!(repo = %repo, error = %e, "Could not add webhook");
                report.failed.push((repo.clone(), e.message));
            }
        }
    }

    report
}

/// Every hook on `repos`, skipping repositories whose hooks cannot be read.
pub async fn list_hooks<G: GitHubInterpreter>(github: &G, repos: &[RepoId]) -> Vec<HookListing> {
    let mut listings = Vec::new();
    for repo in repos {
        match repo_hooks(github, repo).await {
            Ok(hooks) if hooks.is_empty() => {}
            Ok(hooks) => listings.push(HookListing {
                repo: repo.clone(),
                hooks,
            }),
            Err(e) => tracing::debug!(repo = %repo, error = %e, "Skipping repository"),
        }
    }
    listings
}

/// Deletes every hook on `repos` that delivers to `url`. Other hooks are
/// left alone.
pub async fn remove_hooks<G: GitHubInterpreter>(
    github: &G,
    repos: &[RepoId],
    url: &str,
) -> RemovalReport {
    let mut report = RemovalReport::default();

    for repo in repos {
        let hooks = match repo_hooks(github, repo).await {
            Ok(hooks) => hooks,
            Err(e) => {
                report.failed.push((repo.clone(), e.message));
                continue;
            }
        };

        for hook in hooks.iter().filter(|h| h.delivers_to(url)) {
            let effect = GitHubEffect::DeleteHook {
                repo: repo.clone(),
                id: hook.id,
            };
            match github.interpret(effect).await {
                Ok(_) => {
                    tracing::info!(repo = %repo, hook = %hook.id, "Webhook removed");
                    report.removed.push((repo.clone(), hook.id));
                }
                Err(e) => report.failed.push((repo.clone(), e.message)),
            }
        }
    }

    report
}

/// Reads a yes/no prompt answer. Only `y` and `yes` agree.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
