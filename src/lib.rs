//! Repo Steward - a GitHub bot that arbitrates competing requests to be
//! assigned an issue and answers comments in the commenter's own style.
//!
//! The library holds the webhook pipeline (verify, parse, route), the
//! assignment arbitrator, the style profiler, the response generator and the
//! rate-limit governor. The binary wires them to octocrab, an LLM provider
//! and Resend, and can also install its webhook across the account's public
//! repositories.

pub mod assignment;
pub mod config;
pub mod effects;
pub mod generation;
pub mod github;
pub mod hooks;
pub mod notify;
pub mod retry;
pub mod server;
pub mod style;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_utils;
