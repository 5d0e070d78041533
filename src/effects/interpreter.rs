//! Effect interpreter trait.
//!
//! The trait-based design enables:
//! - Mock interpreters for testing
//! - Wrapping interpreters (the rate-limit governor)

use std::future::Future;

use super::github::{GitHubEffect, GitHubResponse};
use crate::github::GitHubApiError;

/// Interprets GitHub effects against the GitHub API.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct FixedInterpreter;
///
/// impl GitHubInterpreter for FixedInterpreter {
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
///         match effect {
///             GitHubEffect::GetAuthenticatedUser => Ok(GitHubResponse::User { login: "bot".into() }),
///             other => Err(GitHubApiError::permanent(format!("unexpected: {}", other.name()))),
///         }
///     }
/// }
/// ```
pub trait GitHubInterpreter: Send + Sync {
    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, GitHubApiError>> + Send;
}
