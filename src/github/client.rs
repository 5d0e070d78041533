//! Octocrab client wrapper.
//!
//! One authenticated session serves every repository the token can reach;
//! effects carry their own [`RepoId`](crate::types::RepoId).

use octocrab::Octocrab;

use crate::retry::RetryConfig;

/// An authenticated GitHub API session plus its retry settings.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
    retry_config: RetryConfig,
}

impl OctocrabClient {
    pub fn new(client: Octocrab) -> Self {
        Self {
            client,
            retry_config: RetryConfig::GITHUB,
        }
    }

    /// Creates a client authenticated with a personal access token.
    pub fn from_token(token: impl Into<String>) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(client))
    }

    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry_config
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("retry_config", &self.retry_config)
            .finish_non_exhaustive()
    }
}
