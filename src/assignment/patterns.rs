//! Assignment-request phrase detection.

use std::sync::LazyLock;

use regex::RegexSet;

/// Phrasings that ask for an issue to be assigned to the commenter.
pub const ASSIGNMENT_PATTERNS: &[&str] = &[
    r"\bassign\s+me\b",
    r"\bi\s+want\s+to\s+work\s+on\s+this\b",
    r"\bcan\s+i\s+work\s+on\s+this\b",
    r"\bi\s+would\s+like\s+to\s+work\s+on\s+this\b",
    r"\bi['’]d\s+like\s+to\s+take\s+this\b",
    r"\bplease\s+assign\s+me\b",
    r"\bi\s+can\s+work\s+on\s+this\b",
    r"\blet\s+me\s+work\s+on\s+this\b",
];

static ASSIGNMENT_RE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(ASSIGNMENT_PATTERNS.iter().map(|p| format!("(?i){p}")))
        .expect("valid assignment patterns")
});

/// Returns true if `text` asks for the issue to be assigned to its author.
///
/// # Examples
///
/// ```
/// use repo_steward::assignment::is_assignment_request;
///
/// assert!(is_assignment_request("Hi! Can I work on this?"));
/// assert!(is_assignment_request("PLEASE ASSIGN ME"));
/// assert!(!is_assignment_request("This crashes on startup."));
/// ```
pub fn is_assignment_request(text: &str) -> bool {
    ASSIGNMENT_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const REQUESTS: &[&str] = &[
        "assign me",
        "I want to work on this",
        "can I work on this",
        "I would like to work on this",
        "I'd like to take this",
        "please assign me",
        "I can work on this",
        "let me work on this",
    ];

    #[test]
    fn every_phrasing_matches() {
        for phrase in REQUESTS {
            assert!(is_assignment_request(phrase), "{phrase}");
        }
    }

    #[test]
    fn matches_inside_longer_comments() {
        assert!(is_assignment_request(
            "Hey, this looks fun.\nCould you please assign me? Thanks!"
        ));
        assert!(is_assignment_request("I’d like to take this one"));
        assert!(is_assignment_request("can   i\twork on this"));
    }

    #[test]
    fn unrelated_text_does_not_match() {
        for text in [
            "",
            "The build fails on Windows",
            "Who is working on this?",
            "reassignment of variables is broken",
            "assignme",
            "I can't reproduce this",
            "Please assign the label",
        ] {
            assert!(!is_assignment_request(text), "{text}");
        }
    }

    fn random_case(s: &str, flips: &[bool]) -> String {
        s.chars()
            .zip(flips.iter().cycle())
            .map(|(c, &upper)| {
                if upper {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    }

    proptest! {
        #[test]
        fn any_casing_with_surrounding_text_matches(
            index in 0..REQUESTS.len(),
            flips in prop::collection::vec(any::<bool>(), 1..16),
            prefix in "[a-z ,.!]{0,20}",
            suffix in "[a-z ,.!?]{0,20}",
        ) {
            let phrase = random_case(REQUESTS[index], &flips);
            let text = format!("{prefix} {phrase} {suffix}");
            prop_assert!(is_assignment_request(&text));
        }

        #[test]
        fn digits_and_punctuation_never_match(text in "[0-9 .,;:!?#()-]{0,80}") {
            prop_assert!(!is_assignment_request(&text));
        }
    }
}
