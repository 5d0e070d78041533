//! Issue assignment arbitration.
//!
//! When someone asks to be assigned an unassigned issue, every requester on
//! the issue competes; the most engaged one wins.

mod arbitrator;
pub mod messages;
mod patterns;

pub use arbitrator::{
    ArbitrationInput, ArbitrationOutcome, AssignmentCandidate, arbitrate, collect_candidates,
    rank_candidates, rank_order,
};
pub use patterns::{ASSIGNMENT_PATTERNS, is_assignment_request};
