//! Answer synthesis: intent-keyed fallback chains over ranked candidates.
//!
//! [`answer_question`] is the single entry point the application calls
//! once retrieval has produced candidates. It extracts entities from the
//! question, classifies the intent, narrows the candidates through the
//! scope filter, and walks the selected intent's fallback chain in rank
//! order. An extraction miss at any step simply advances the chain; only
//! the terminal step produces a fixed "not found" sentence, and that is
//! a normal answer, never an error.
//!
//! # Member display name
//!
//! Templated steps need a member name to address. It resolves in order:
//! the name extracted from the question, else the matching candidate's
//! member field when non-empty, else the generic phrasing ("They" / no
//! prefix). The candidate fallback is what lets "How many cars does
//! Vikram have?" answer "Vikram has 2 cars." even though no member
//! pattern matches that question shape.

use crate::extract;
use crate::filter;
use crate::intent::Intent;
use crate::models::{Candidate, ExtractedEntities};

/// Minimum trimmed length for a travel message to be quoted directly.
const MIN_TRAVEL_QUOTE_LEN: usize = 20;

/// Keywords that mark a message as travel talk for the quote fallback.
const TRAVEL_KEYWORDS: &[&str] = &["trip", "trips", "travel", "flight", "itinerary"];

const NOT_FOUND_TRAVEL: &str = "Sorry, I couldn't find travel details.";
const NOT_FOUND_COUNT: &str = "Sorry, I couldn't find how many cars.";
const NOT_FOUND_PREFERENCE: &str = "Sorry, I couldn't find favorite restaurants.";
const NOT_FOUND_GENERIC: &str = "Sorry, I couldn't find an answer.";

/// Produce the final answer text for a question over ranked candidates.
pub fn answer_question(question: &str, retrieved: Vec<Candidate>) -> String {
    let entities = ExtractedEntities {
        member: extract::member_from_question(question),
        location: extract::location_from_question(question),
    };
    let scope = filter::scope(retrieved, &entities);

    match Intent::classify(question) {
        Intent::Travel => travel_answer(&entities, &scope),
        Intent::Count => count_answer(&entities, &scope),
        Intent::Preference => preference_answer(&entities, &scope),
        Intent::Generic => generic_answer(&scope),
    }
}

/// Resolve the member name to display: question entities first, then the
/// candidate's own member field.
fn resolve_member<'a>(entities: &'a ExtractedEntities, candidate: &'a Candidate) -> Option<&'a str> {
    entities
        .member
        .as_deref()
        .or_else(|| Some(candidate.message.member.as_str()).filter(|m| !m.is_empty()))
}

/// Quote a candidate's raw text, prefixed with the member name if known.
fn quoted(entities: &ExtractedEntities, candidate: &Candidate) -> String {
    match resolve_member(entities, candidate) {
        Some(member) => format!("{} mentioned: {}", member, candidate.message.text),
        None => candidate.message.text.clone(),
    }
}

fn travel_answer(entities: &ExtractedEntities, scope: &[Candidate]) -> String {
    // 1. First candidate carrying a date-like string.
    for c in scope {
        if let Some(date) = extract::date_from_text(&c.message.text) {
            let member = resolve_member(entities, c);
            return match (member, entities.location.as_deref()) {
                (Some(member), Some(location)) => {
                    format!("{} is planning the trip to {} on {}.", member, location, date)
                }
                (Some(member), None) => format!("{}'s trip is on {}.", member, date),
                (None, _) => format!("The trip is on {}.", date),
            };
        }
    }

    // 2. First candidate that actually talks about travel at some length.
    for c in scope {
        let text_l = c.message.text.to_lowercase();
        if TRAVEL_KEYWORDS.iter().any(|kw| text_l.contains(kw))
            && c.message.text.trim().len() > MIN_TRAVEL_QUOTE_LEN
        {
            return quoted(entities, c);
        }
    }

    // 3. Top candidate, for transparency.
    if let Some(top) = scope.first() {
        return quoted(entities, top);
    }

    NOT_FOUND_TRAVEL.to_string()
}

fn count_answer(entities: &ExtractedEntities, scope: &[Candidate]) -> String {
    for c in scope {
        if let Some(count) = extract::count_from_text(&c.message.text) {
            let noun = if count == 1 { "car" } else { "cars" };
            return match resolve_member(entities, c) {
                Some(member) => format!("{} has {} {}.", member, count, noun),
                None => format!("They have {} {}.", count, noun),
            };
        }
    }

    match scope.first() {
        Some(top) => top.message.text.clone(),
        None => NOT_FOUND_COUNT.to_string(),
    }
}

fn preference_answer(entities: &ExtractedEntities, scope: &[Candidate]) -> String {
    for c in scope {
        let places = extract::places_from_text(&c.message.text);
        if !places.is_empty() {
            let names = places.join(", ");
            return match resolve_member(entities, c) {
                Some(member) => format!("{}'s favorite restaurants include: {}.", member, names),
                None => format!("Favorite restaurants include: {}.", names),
            };
        }
    }

    match scope.first() {
        Some(top) => top.message.text.clone(),
        None => NOT_FOUND_PREFERENCE.to_string(),
    }
}

fn generic_answer(scope: &[Candidate]) -> String {
    match scope.first() {
        Some(top) => top.message.text.clone(),
        None => NOT_FOUND_GENERIC.to_string(),
    }
}
