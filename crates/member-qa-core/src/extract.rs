//! Regex-driven entity extractors.
//!
//! Each extractor is a pure function over text. Where an extractor tries
//! several patterns, the patterns live in an explicit ordered list and
//! the first success wins — the priority order is data, not a chain of
//! `if` statements, so it can be inspected and tested on its own.
//!
//! Extraction misses are not errors: every function returns `Option` (or
//! an empty `Vec`) and the answer synthesizer treats a miss as the
//! trigger for its next fallback step.

use once_cell::sync::Lazy;
use regex::Regex;

/// A capitalized one-or-two-word name, e.g. `Layla` or `Priya Sharma`.
const NAME: &str = r"[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?";

/// Member-name patterns, in priority order. The cue word of the last
/// pattern is case-insensitive; the name itself must stay capitalized.
///
/// | Priority | Pattern |
/// |----------|---------|
/// | 1 | possessive: `Name's` |
/// | 2 | `about Name` |
/// | 3 | `for Name` |
/// | 4 | `when is Name` (cue case-insensitive) |
static MEMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"\b({NAME})['’]s\b"),
        format!(r"\babout\s+({NAME})\b"),
        format!(r"\bfor\s+({NAME})\b"),
        format!(r"\b(?i:when\s+is)\s+({NAME})\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid member pattern"))
    .collect()
});

/// Extract a member name from a question, if any pattern matches.
pub fn member_from_question(question: &str) -> Option<String> {
    MEMBER_PATTERNS
        .iter()
        .find_map(|re| re.captures(question).map(|c| c[1].to_string()))
}

/// `trip to Place` — cue case-insensitive, Place one capitalized run.
static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?i:trip\s+to)\s+([A-Z][A-Za-z]+)\b").expect("valid location pattern"));

/// Extract a destination from a question ("trip to Place").
pub fn location_from_question(question: &str) -> Option<String> {
    LOCATION_RE
        .captures(question)
        .map(|c| c[1].to_string())
}

/// Date patterns, in priority order. All are matched case-insensitively
/// through a single alternation; the leftmost match in the text wins,
/// and at equal positions the earlier pattern wins (regex leftmost-first
/// alternation semantics).
///
/// | Priority | Shape | Example |
/// |----------|-------|---------|
/// | 1 | ISO date | `2025-11-09` |
/// | 2 | slash date | `11/9/2025` |
/// | 3 | month day[, year] | `Nov 9, 2025` |
/// | 4 | day month[ year] | `9 Nov 2025` |
/// | 5 | relative term | `next week` |
const DATE_PATTERNS: &[&str] = &[
    r"\b\d{4}-\d{2}-\d{2}\b",
    r"\b\d{1,2}/\d{1,2}/\d{2,4}\b",
    r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*\s+\d{1,2}(?:,\s*\d{4})?\b",
    r"\b\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*(?:\s+\d{4})?\b",
    r"\b(?:today|tomorrow|tonight|this week|next week|this weekend|next weekend)\b",
];

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("(?i){}", DATE_PATTERNS.join("|"))).expect("valid date alternation")
});

/// Extract the first date-like substring from free text.
pub fn date_from_text(text: &str) -> Option<String> {
    DATE_RE.find(text).map(|m| m.as_str().to_string())
}

/// Spelled-out numbers accepted by [`count_from_text`].
const NUMBER_WORDS: &[(&str, u32)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

/// How many tokens to scan on each side of a `car`/`vehicle` mention.
const COUNT_WINDOW: usize = 8;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Find a count near a `car(s)`/`vehicle(s)` token.
///
/// Scans the lowercased token stream; at each vehicle mention, walks a
/// symmetric [`COUNT_WINDOW`]-token window left to right and returns the
/// first digit token or spelled-out number found.
pub fn count_from_text(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = WORD_RE.find_iter(&lowered).map(|m| m.as_str()).collect();

    for (i, token) in tokens.iter().enumerate() {
        if !matches!(*token, "car" | "cars" | "vehicle" | "vehicles") {
            continue;
        }
        let start = i.saturating_sub(COUNT_WINDOW);
        let end = (i + COUNT_WINDOW + 1).min(tokens.len());
        for candidate in &tokens[start..end] {
            if candidate.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(n) = candidate.parse::<u32>() {
                    return Some(n);
                }
            }
            if let Some(&(_, n)) = NUMBER_WORDS.iter().find(|(w, _)| w == candidate) {
                return Some(n);
            }
        }
    }
    None
}

/// A run of capitalized tokens, allowing name punctuation (`Le Jardin`,
/// `P.F. Chang's`, `Shake&Bake`).
static PROPER_RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z'&.-]+(?:\s+[A-Z][A-Za-z'&.-]+)*)\b")
        .expect("valid proper-noun pattern")
});

/// Capitalized run immediately following a place cue word.
static PLACE_CUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:at|to|in)\s+([A-Z][A-Za-z'&.-]+(?:\s+[A-Z][A-Za-z'&.-]+)*)")
        .expect("valid place-cue pattern")
});

static FAVORITE_RESTAURANT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfavorite\b.*\brestaurant").expect("valid favorite pattern"));

/// Pronouns and weekday names excluded from proper-noun place capture.
/// Compared case-insensitively.
const PLACE_STOPLIST: &[&str] = &[
    "i", "we", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Maximum number of named places returned.
const MAX_PLACES: usize = 5;

/// Extract named places (restaurants) from message text.
///
/// Two capture strategies run in order:
///
/// 1. When the text matches `favorite … restaurant`, every capitalized
///    run of three or more characters is captured, minus the
///    pronoun/weekday stoplist.
/// 2. Independently, any capitalized run right after `at`, `to`, or
///    `in` is captured.
///
/// Results are concatenated in that order, deduplicated
/// case-insensitively (first occurrence kept), and truncated to
/// [`MAX_PLACES`].
pub fn places_from_text(text: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    if FAVORITE_RESTAURANT_RE.is_match(text) {
        for cap in PROPER_RUN_RE.captures_iter(text) {
            let name = cap[1].to_string();
            let lowered = name.to_lowercase();
            if PLACE_STOPLIST.contains(&lowered.as_str()) {
                continue;
            }
            if name.len() >= 3 {
                candidates.push(name);
            }
        }
    }

    for cap in PLACE_CUE_RE.captures_iter(text) {
        candidates.push(cap[1].to_string());
    }

    // Deduplicate case-insensitively, preserving first occurrence.
    let mut seen: Vec<String> = Vec::new();
    let mut unique: Vec<String> = Vec::new();
    for c in candidates {
        let key = c.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            unique.push(c);
        }
    }
    unique.truncate(MAX_PLACES);
    unique
}
