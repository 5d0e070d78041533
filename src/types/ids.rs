//! Identifiers shared by the webhook parser, the effects and the handlers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of an issue or pull request.
///
/// Pull requests draw from the issue sequence, so commenting on a pull
/// request's conversation means commenting on the issue with its number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(pub u64);

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for IssueNumber {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0:?} is not an owner/name repository")]
pub struct InvalidRepoName(pub String);

/// A repository, addressed as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Splits a payload's `full_name` field.
    ///
    /// ```
    /// use repo_steward::types::RepoId;
    ///
    /// let id = RepoId::parse_full_name("octocat/hello-world").unwrap();
    /// assert_eq!((id.owner.as_str(), id.repo.as_str()), ("octocat", "hello-world"));
    /// assert!(RepoId::parse_full_name("a/b/c").is_err());
    /// ```
    pub fn parse_full_name(full_name: &str) -> Result<Self, InvalidRepoName> {
        match full_name.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(InvalidRepoName(full_name.to_owned())),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
