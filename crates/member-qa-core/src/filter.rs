//! Scope filtering of retrieval candidates.
//!
//! Narrows ranked candidates to those matching the extracted member and
//! location. Both stages are advisory: a stage that would produce an
//! empty list is skipped and its input passes through unchanged, so a
//! non-empty candidate list is never filtered down to nothing.

use crate::models::{Candidate, ExtractedEntities};

/// Apply the member filter, then the location filter.
///
/// Member stage: keep a candidate when the member name appears
/// case-insensitively in its member field or message text. Location
/// stage: keep when the location appears case-insensitively in the
/// message text. Each stage falls back to its input when it would
/// otherwise empty the list.
pub fn scope(candidates: Vec<Candidate>, entities: &ExtractedEntities) -> Vec<Candidate> {
    let scoped = by_member(candidates, entities.member.as_deref());
    by_location(scoped, entities.location.as_deref())
}

/// Keep candidates mentioning the member; never empties a non-empty input.
pub fn by_member(candidates: Vec<Candidate>, member: Option<&str>) -> Vec<Candidate> {
    let Some(member) = member else {
        return candidates;
    };
    let needle = member.to_lowercase();

    let matched: Vec<Candidate> = candidates
        .iter()
        .filter(|c| {
            c.message.member.to_lowercase().contains(&needle)
                || c.message.text.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    if matched.is_empty() {
        candidates
    } else {
        matched
    }
}

/// Keep candidates mentioning the location; never empties a non-empty input.
pub fn by_location(candidates: Vec<Candidate>, location: Option<&str>) -> Vec<Candidate> {
    let Some(location) = location else {
        return candidates;
    };
    let needle = location.to_lowercase();

    let matched: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.message.text.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    if matched.is_empty() {
        candidates
    } else {
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;

    fn candidate(member: &str, text: &str) -> Candidate {
        Candidate {
            text: format!("{} {}", member, text),
            score: 0.5,
            message: Message {
                id: None,
                member: member.to_string(),
                text: text.to_string(),
                timestamp: None,
            },
        }
    }

    fn sample() -> Vec<Candidate> {
        vec![
            candidate("Layla", "My trip to London is on 2025-11-09"),
            candidate("Vikram", "I have 2 cars"),
            candidate("Amira", "Dinner with Layla went well"),
        ]
    }

    #[test]
    fn test_member_filter_matches_member_field() {
        let scoped = by_member(sample(), Some("Vikram"));
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].message.member, "Vikram");
    }

    #[test]
    fn test_member_filter_matches_text_mention() {
        // "Layla" appears in Amira's message text, so both survive.
        let scoped = by_member(sample(), Some("layla"));
        assert_eq!(scoped.len(), 2);
    }

    #[test]
    fn test_member_filter_never_empties() {
        let scoped = by_member(sample(), Some("Nobody"));
        assert_eq!(scoped.len(), 3, "no match must pass input through");
    }

    #[test]
    fn test_location_filter() {
        let scoped = by_location(sample(), Some("london"));
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].message.member, "Layla");
    }

    #[test]
    fn test_location_filter_never_empties() {
        let scoped = by_location(sample(), Some("Reykjavik"));
        assert_eq!(scoped.len(), 3);
    }

    #[test]
    fn test_scope_combined_stages() {
        let entities = ExtractedEntities {
            member: Some("Layla".to_string()),
            location: Some("London".to_string()),
        };
        let scoped = scope(sample(), &entities);
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].message.member, "Layla");
    }

    #[test]
    fn test_scope_never_empty_for_any_combination() {
        let input = sample();
        for member in [None, Some("Layla"), Some("Nobody")] {
            for location in [None, Some("London"), Some("Reykjavik")] {
                let entities = ExtractedEntities {
                    member: member.map(str::to_string),
                    location: location.map(str::to_string),
                };
                let scoped = scope(input.clone(), &entities);
                assert!(
                    !scoped.is_empty(),
                    "scope emptied candidates for member={:?} location={:?}",
                    member,
                    location
                );
            }
        }
    }

    #[test]
    fn test_scope_empty_input_stays_empty() {
        let entities = ExtractedEntities::default();
        assert!(scope(Vec::new(), &entities).is_empty());
    }
}
