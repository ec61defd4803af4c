//! Corpus statistics overview.
//!
//! Summarizes the persisted snapshot: message and member counts, the
//! timestamp range, and how often the answerable topic cues appear.
//! Used by `mqa stats` to sanity-check a crawl before serving.

use anyhow::{bail, Result};
use std::collections::HashMap;

use member_qa_core::models::{Message, RawMessage};

use crate::config::Config;
use crate::snapshot;

/// Topic cues the intent classifier keys on; their frequency is a rough
/// measure of how much of the corpus the templated answers can cover.
const KEYWORD_CUES: &[&str] = &[
    "trip",
    "travel",
    "flight",
    "car",
    "vehicle",
    "restaurant",
    "reservation",
];

/// How many of the most active members to list.
const TOP_MEMBERS: usize = 5;

/// Run the stats command: load the snapshot and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let raw = snapshot::load_first_available(&config.cache.snapshot_paths());
    if raw.is_empty() {
        bail!("No snapshot found; run `mqa fetch` first");
    }

    let messages: Vec<Message> = raw.iter().map(RawMessage::normalize).collect();
    let with_text = messages.iter().filter(|m| !m.text.trim().is_empty()).count();

    let mut per_member: HashMap<&str, usize> = HashMap::new();
    for m in &messages {
        if !m.member.is_empty() {
            *per_member.entry(m.member.as_str()).or_insert(0) += 1;
        }
    }

    let timestamps: Vec<_> = messages.iter().filter_map(|m| m.timestamp).collect();

    println!("Member QA — Corpus Stats");
    println!("========================");
    println!();
    println!("  Messages:      {}", messages.len());
    println!("  With text:     {}", with_text);
    println!("  Empty text:    {}", messages.len() - with_text);
    println!("  Members:       {}", per_member.len());
    if let (Some(min), Some(max)) = (timestamps.iter().min(), timestamps.iter().max()) {
        println!("  Oldest:        {}", min.format("%Y-%m-%d %H:%M"));
        println!("  Newest:        {}", max.format("%Y-%m-%d %H:%M"));
    }

    println!();
    println!("  {:<14} COUNT", "CUE");
    for cue in KEYWORD_CUES {
        let count = messages
            .iter()
            .filter(|m| m.text.to_lowercase().contains(cue))
            .count();
        println!("  {:<14} {}", cue, count);
    }

    let mut ranked: Vec<(&str, usize)> = per_member.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(TOP_MEMBERS);

    println!();
    println!("  {:<20} MESSAGES", "TOP MEMBERS");
    for (member, count) in ranked {
        println!("  {:<20} {}", member, count);
    }

    Ok(())
}
