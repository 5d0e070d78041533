//! Handler for `issues` events. Logged only; replies are driven by comments.

use super::HandlerOutcome;
use crate::webhooks::events::IssuesEvent;

pub fn handle_issues(event: &IssuesEvent) -> HandlerOutcome {
    tracing::info!(repo = %event.repo, issue = event.number.0, action = %event.action, "Issue event");
    HandlerOutcome::Processed
}
