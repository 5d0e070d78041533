//! Writing-style profiling.
//!
//! [`profile_comments`] is pure; [`gather_recent_comments`] and
//! [`profile_user`] fetch the history it runs on.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::GitHubApiError;
use crate::types::{CommentRef, RepoId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Neutral,
    Positive,
    Inquisitive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    #[default]
    Neutral,
    Formal,
    Casual,
}

/// Summary of how a user writes. The default is the empty-history profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStyleProfile {
    /// Mean comment length in characters.
    pub avg_length: usize,
    pub tone: Tone,
    pub formality: Formality,
    pub uses_emojis: bool,
    /// Mean sentence terminators per comment (at least 1.0 when any exist).
    pub avg_sentences: f64,
}

/// How many recent comments are profiled and where they are looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Maximum comments profiled.
    pub limit: usize,
    /// Most recently updated issues scanned for the user's comments.
    pub scan_window: u8,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            scan_window: 20,
        }
    }
}

const FORMAL_PHRASES: &[&str] = &[
    "please",
    "thank you",
    "regards",
    "would you",
    "could you",
    "kindly",
    "appreciate",
    "sincerely",
    "furthermore",
    "however",
    "therefore",
];

const CASUAL_PHRASES: &[&str] = &[
    "hey", "lol", "gonna", "wanna", "yeah", "cool", "awesome", "btw", "thx", "hi", "yo", "nope",
];

const POSITIVE_PHRASES: &[&str] = &[
    "thanks",
    "thank you",
    "great",
    "awesome",
    "love",
    "nice",
    "excellent",
    "appreciate",
    "amazing",
    "good",
];

const QUESTION_PHRASES: &[&str] = &[
    "how", "why", "what", "when", "where", "could you", "can you", "is there",
];

/// Emoticons, pictographs, transport, flags, dingbats and supplemental symbols.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F),
    (0x1F300, 0x1F5FF),
    (0x1F680, 0x1F6FF),
    (0x1F1E0, 0x1F1FF),
    (0x2600, 0x26FF),
    (0x2700, 0x27BF),
    (0x1F900, 0x1F9FF),
];

fn phrase_regex(phrases: &[&str]) -> Regex {
    let alternation = phrases
        .iter()
        .map(|p| p.split(' ').map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("valid phrase regex")
}

static FORMAL_RE: LazyLock<Regex> = LazyLock::new(|| phrase_regex(FORMAL_PHRASES));
static CASUAL_RE: LazyLock<Regex> = LazyLock::new(|| phrase_regex(CASUAL_PHRASES));
static POSITIVE_RE: LazyLock<Regex> = LazyLock::new(|| phrase_regex(POSITIVE_PHRASES));
static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| phrase_regex(QUESTION_PHRASES));

fn is_emoji(c: char) -> bool {
    let cp = u32::from(c);
    EMOJI_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// Classifies formality from phrase tallies (strict 1.5x dominance).
pub fn classify_formality(formal_hits: usize, casual_hits: usize) -> Formality {
    let (formal, casual) = (formal_hits as f64, casual_hits as f64);
    if formal > 1.5 * casual {
        Formality::Formal
    } else if casual > 1.5 * formal {
        Formality::Casual
    } else {
        Formality::Neutral
    }
}

/// Classifies tone; positive wins over inquisitive.
pub fn classify_tone(positive_hits: usize, question_hits: usize, comments: usize) -> Tone {
    let half = comments as f64 / 2.0;
    if positive_hits as f64 > half {
        Tone::Positive
    } else if question_hits as f64 > half {
        Tone::Inquisitive
    } else {
        Tone::Neutral
    }
}

/// Profiles a set of comment bodies.
pub fn profile_comments<S: AsRef<str>>(comments: &[S]) -> UserStyleProfile {
    if comments.is_empty() {
        return UserStyleProfile::default();
    }
    let n = comments.len();

    let mut total_chars = 0usize;
    let mut terminators = 0usize;
    let mut uses_emojis = false;
    let (mut formal, mut casual, mut positive, mut questions) = (0, 0, 0, 0);

    for body in comments {
        let body = body.as_ref();
        total_chars += body.chars().count();
        terminators += body.chars().filter(|c| matches!(c, '.' | '!' | '?')).count();
        uses_emojis |= body.chars().any(is_emoji);

        formal += FORMAL_RE.find_iter(body).count();
        casual += CASUAL_RE.find_iter(body).count();
        positive += POSITIVE_RE.find_iter(body).count();
        questions += body.matches('?').count() + QUESTION_RE.find_iter(body).count();
    }

    let avg_sentences = if terminators == 0 {
        0.0
    } else {
        (terminators as f64 / n as f64).max(1.0)
    };

    UserStyleProfile {
        avg_length: total_chars / n,
        tone: classify_tone(positive, questions, n),
        formality: classify_formality(formal, casual),
        uses_emojis,
        avg_sentences,
    }
}

/// Collects up to `config.limit` of the user's most recent comments from the
/// most recently updated issues of `repo`, newest first.
///
/// An issue whose comments cannot be listed is skipped.
pub async fn gather_recent_comments<G: GitHubInterpreter>(
    github: &G,
    repo: &RepoId,
    username: &str,
    config: ProfilerConfig,
) -> Result<Vec<CommentRef>, GitHubApiError> {
    let issues = match github
        .interpret(GitHubEffect::ListRecentIssues {
            repo: repo.clone(),
            limit: config.scan_window,
        })
        .await?
    {
        GitHubResponse::Issues(issues) => issues,
        other => {
            return Err(GitHubApiError::permanent(format!(
                "unexpected response to list_recent_issues: {other:?}"
            )));
        }
    };

    let mut found = Vec::new();
    for issue in issues {
        let listed = github
            .interpret(GitHubEffect::ListIssueComments {
                repo: repo.clone(),
                issue: issue.number,
            })
            .await;
        match listed {
            Ok(GitHubResponse::Comments(comments)) => {
                found.extend(comments.into_iter().filter(|c| c.author == username));
            }
            Ok(other) => {
                tracing::warn!(issue = issue.number.0, response = ?other, "Unexpected comments response");
            }
            Err(e) => {
                tracing::warn!(issue = issue.number.0, error = %e, "Skipping issue while profiling");
            }
        }
    }

    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    found.truncate(config.limit);
    Ok(found)
}

/// Fetches and profiles a user's recent comments.
///
/// Falls back to the default profile if the history cannot be fetched.
pub async fn profile_user<G: GitHubInterpreter>(
    github: &G,
    repo: &RepoId,
    username: &str,
    config: ProfilerConfig,
) -> UserStyleProfile {
    match gather_recent_comments(github, repo, username, config).await {
        Ok(comments) => {
            let bodies: Vec<&str> = comments.iter().map(|c| c.body.as_str()).collect();
            let profile = profile_comments(&bodies);
            tracing::debug!(
                repo = %repo,
                user = username,
                comments = bodies.len(),
                ?profile,
                "Built style profile"
            );
            profile
        }
        Err(e) => {
            tracing::warn!(repo = %repo, user = username, error = %e, "Could not profile user; using default style");
            UserStyleProfile::default()
        }
    }
}
