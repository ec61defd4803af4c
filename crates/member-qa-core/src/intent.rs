//! Keyword-based intent classification.
//!
//! The classifier is a fixed, ordered list of keyword rules; the first
//! rule that matches the (lowercased) question wins. The ordering is a
//! deliberate priority policy, not alphabetical — a question matching
//! several categories resolves to the earliest one.
//!
//! | Priority | Intent | Rule |
//! |----------|--------|------|
//! | 1 | [`Intent::Travel`] | contains `trip`, `travel`, or `flight` |
//! | 2 | [`Intent::Count`] | contains `how many` and (`car` or `vehicle`) |
//! | 3 | [`Intent::Preference`] | contains `restaurant` or `favorite` |
//! | 4 | [`Intent::Generic`] | always matches (terminal fallback) |

/// The answer strategy selected from the question text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Travel plans: dates, destinations, itineraries.
    Travel,
    /// "How many cars/vehicles" style counting questions.
    Count,
    /// Favorite restaurants and similar named-place preferences.
    Preference,
    /// No keyword matched; answer with the top retrieved message.
    Generic,
}

impl Intent {
    /// Classify a question. Never fails: [`Intent::Generic`] is the
    /// terminal fallback.
    pub fn classify(question: &str) -> Intent {
        let q = question.to_lowercase();

        if q.contains("trip") || q.contains("travel") || q.contains("flight") {
            Intent::Travel
        } else if q.contains("how many") && (q.contains("car") || q.contains("vehicle")) {
            Intent::Count
        } else if q.contains("restaurant") || q.contains("favorite") {
            Intent::Preference
        } else {
            Intent::Generic
        }
    }
}
