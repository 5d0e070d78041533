//! Turns a [`UserStyleProfile`] into guidance appended to the request context.

use super::profiler::{Formality, Tone, UserStyleProfile};

/// How long replies to a user should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthBucket {
    VeryBrief,
    Concise,
    Detailed,
}

impl LengthBucket {
    pub fn from_avg_length(avg_length: usize) -> Self {
        match avg_length {
            0..100 => LengthBucket::VeryBrief,
            100..300 => LengthBucket::Concise,
            _ => LengthBucket::Detailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthBucket::VeryBrief => "very brief",
            LengthBucket::Concise => "concise",
            LengthBucket::Detailed => "detailed",
        }
    }
}

fn length_guidance(bucket: LengthBucket) -> String {
    match bucket {
        LengthBucket::VeryBrief => "Keep the response very brief (1-2 sentences).".to_string(),
        LengthBucket::Concise => "Keep the response concise (a short paragraph).".to_string(),
        LengthBucket::Detailed => {
            "The user writes at length; a detailed response is welcome.".to_string()
        }
    }
}

fn formality_guidance(formality: Formality) -> &'static str {
    match formality {
        Formality::Formal => "Use a formal, professional tone.",
        Formality::Casual => "Use a casual, friendly tone.",
        Formality::Neutral => "Use a balanced, approachable tone.",
    }
}

fn tone_guidance(tone: Tone) -> Option<&'static str> {
    match tone {
        Tone::Inquisitive => Some("The user asks many questions; be thorough and educational."),
        Tone::Positive => Some("The user is upbeat; match enthusiasm."),
        Tone::Neutral => None,
    }
}

fn emoji_guidance(uses_emojis: bool) -> &'static str {
    if uses_emojis {
        "Emojis: use sparingly if natural."
    } else {
        "Emojis: avoid."
    }
}

/// Appends style guidance for `profile` to `base_context`.
///
/// # Examples
///
/// ```
/// use repo_steward::style::{UserStyleProfile, build_context};
///
/// let context = build_context("Issue #1: Crash", &UserStyleProfile::default());
/// assert!(context.starts_with("Issue #1: Crash\n\n"));
/// assert!(context.contains("very brief"));
/// ```
pub fn build_context(base_context: &str, profile: &UserStyleProfile) -> String {
    let mut lines = vec![
        length_guidance(LengthBucket::from_avg_length(profile.avg_length)),
        formality_guidance(profile.formality).to_string(),
    ];
    if let Some(tone) = tone_guidance(profile.tone) {
        lines.push(tone.to_string());
    }
    lines.push(emoji_guidance(profile.uses_emojis).to_string());

    let guidance = lines
        .iter()
        .map(|l| format!("- {l}"))
        .collect::<Vec<_>>()
        .join("\n");

    if base_context.trim().is_empty() {
        format!("Response style guidance:\n{guidance}")
    } else {
        format!("{base_context}\n\nResponse style guidance:\n{guidance}")
    }
}
