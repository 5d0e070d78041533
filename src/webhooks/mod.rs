//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Event parsing into typed events
//! - Event routing to the assignment, reply and notification handlers

pub mod events;
pub mod handlers;
pub mod parser;
pub mod signature;

pub use events::{
    CommentAction, GitHubEvent, IssueCommentEvent, IssuesEvent, PrAction, PullRequestEvent,
};
pub use handlers::{HandlerError, HandlerOutcome, Services, route_event};
pub use parser::{ParseError, parse_webhook};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_delivery,
    verify_signature,
};
