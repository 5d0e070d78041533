//! Per-user writing style: profile a user's recent comments, then turn the
//! profile into guidance for the response generator.

mod context;
mod profiler;

pub use context::{LengthBucket, build_context};
pub use profiler::{
    Formality, ProfilerConfig, Tone, UserStyleProfile, classify_formality, classify_tone,
    gather_recent_comments, profile_comments, profile_user,
};
