//! Effects-as-data for GitHub operations.
//!
//! Handlers describe what they want done on GitHub as [`GitHubEffect`] values
//! and hand them to a [`GitHubInterpreter`]. The production interpreter talks
//! to the REST API; tests record the effects instead.

pub mod github;
pub mod interpreter;

pub use github::{GitHubEffect, GitHubResponse};
pub use interpreter::GitHubInterpreter;
