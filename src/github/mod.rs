//! GitHub API client, effect interpreter and rate-limit governor.
//!
//! Key features:
//! - Exponential backoff retry for transient failures
//! - Distinguishes transient vs permanent errors
//! - Blocks outbound calls while the rate-limit window is nearly exhausted

mod client;
mod error;
mod governor;
mod interpreter;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use governor::{Governed, RateLimitCache};
pub use interpreter::interpret_github_effect;
