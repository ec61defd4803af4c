//! TF-IDF retrieval index and the [`Corpus`] it serves.
//!
//! A [`Corpus`] is an ordered set of messages paired with a fitted
//! bag-of-terms weighting model. Fitting happens once per rebuild, over
//! the concatenation of member name and message text per document;
//! queries are transformed under the same fitted vocabulary and scored
//! with cosine similarity.
//!
//! # Weighting
//!
//! - Lowercased word tokens of two or more characters.
//! - English stopword removal, then unigrams **and** bigrams.
//! - Vocabulary capped at `max_features`, keeping the most frequent
//!   terms (ties broken alphabetically, so fits are deterministic).
//! - Smoothed IDF: `ln((1 + n) / (1 + df)) + 1`.
//! - Rows are L2-normalized, so cosine similarity reduces to a sparse
//!   dot product and always lands in `[0.0, 1.0]`.
//!
//! # Ranking
//!
//! [`Corpus::rank`] sorts by descending score with ties broken by
//! original corpus order (Rust's stable sort gives this for free) and
//! truncates to `k`. Empty queries, empty corpora, and corpora whose
//! documents were all stopwords produce an empty result rather than an
//! error.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Candidate, Message};

/// Default vocabulary cap, matching the ingestion-scale assumption of a
/// few tens of thousands of short messages.
pub const DEFAULT_MAX_FEATURES: usize = 50_000;

/// Common English words removed before n-gram construction.
///
/// Deliberately compact: member messages are short and informal, so a
/// small list of function words is enough to keep the index from being
/// dominated by glue tokens.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his",
    "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me", "more", "most",
    "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other",
    "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when",
    "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your",
    "yours",
];

/// Word tokens: two or more word characters, lowercased by the caller.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

/// Split text into lowercased stopword-free unigrams and bigrams.
fn terms_of(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| !STOPWORDS.contains(w))
        .collect();

    let mut terms: Vec<String> = words.iter().map(|w| (*w).to_string()).collect();
    for pair in words.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

/// A sparse document or query vector: `(term id, weight)` pairs sorted
/// by term id, L2-normalized at construction.
#[derive(Debug, Clone, Default)]
struct SparseVector(Vec<(usize, f64)>);

impl SparseVector {
    /// Build a normalized vector from raw term counts weighted by IDF.
    fn from_counts(counts: &HashMap<usize, usize>, idf: &[f64]) -> Self {
        let mut entries: Vec<(usize, f64)> = counts
            .iter()
            .map(|(&term, &count)| (term, count as f64 * idf[term]))
            .collect();
        entries.sort_by_key(|&(term, _)| term);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }
        SparseVector(entries)
    }

    /// Dot product of two sorted sparse vectors.
    fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].0.cmp(&other.0[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.0[i].1 * other.0[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// A fitted TF-IDF model: vocabulary, IDF weights, and one normalized
/// row per indexed document.
#[derive(Debug, Default)]
struct TfidfIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<SparseVector>,
}

impl TfidfIndex {
    /// Fit the vocabulary and document rows over `docs`.
    fn fit(docs: &[String], max_features: usize) -> Self {
        let per_doc_terms: Vec<Vec<String>> = docs.iter().map(|d| terms_of(d)).collect();

        // Collection frequency and document frequency per term.
        let mut collection_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for terms in &per_doc_terms {
            let mut seen: HashMap<&str, ()> = HashMap::new();
            for term in terms {
                *collection_freq.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str(), ()).is_none() {
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        // Cap the vocabulary: most frequent first, alphabetical on ties,
        // then reassign ids alphabetically for a deterministic layout.
        let mut ranked: Vec<(&str, usize)> = collection_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features);
        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();

        let vocabulary: HashMap<String, usize> = kept
            .iter()
            .enumerate()
            .map(|(id, term)| ((*term).to_string(), id))
            .collect();

        // Smoothed IDF over the kept vocabulary.
        let n_docs = docs.len() as f64;
        let mut idf = vec![0.0; vocabulary.len()];
        for (term, &id) in &vocabulary {
            let df = doc_freq.get(term.as_str()).copied().unwrap_or(0) as f64;
            idf[id] = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
        }

        let rows = per_doc_terms
            .iter()
            .map(|terms| {
                let mut counts: HashMap<usize, usize> = HashMap::new();
                for term in terms {
                    if let Some(&id) = vocabulary.get(term.as_str()) {
                        *counts.entry(id).or_insert(0) += 1;
                    }
                }
                SparseVector::from_counts(&counts, &idf)
            })
            .collect();

        TfidfIndex {
            vocabulary,
            idf,
            rows,
        }
    }

    /// Transform a query under the fitted vocabulary.
    ///
    /// Unknown terms are dropped; a query made entirely of unknown terms
    /// yields an empty (all-zero) vector, which scores 0 against every
    /// document.
    fn transform(&self, query: &str) -> SparseVector {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for term in terms_of(query) {
            if let Some(&id) = self.vocabulary.get(term.as_str()) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        SparseVector::from_counts(&counts, &self.idf)
    }
}

/// The current indexed set of messages available for retrieval.
///
/// Invariant: index row `i` always corresponds to `messages()[i]`.
/// Messages with empty text are excluded before indexing — they remain
/// irretrievable, not an error. A rebuild produces a whole new `Corpus`;
/// partial updates are never exposed.
#[derive(Debug, Default)]
pub struct Corpus {
    messages: Vec<Message>,
    index: TfidfIndex,
}

impl Corpus {
    /// Build a corpus from normalized messages.
    ///
    /// Empty-text messages are dropped; the fit document for each kept
    /// message is `"{member} {text}"`, so member names participate in
    /// matching.
    pub fn build(messages: Vec<Message>, max_features: usize) -> Self {
        let messages: Vec<Message> = messages
            .into_iter()
            .filter(|m| !m.text.trim().is_empty())
            .collect();

        let docs: Vec<String> = messages.iter().map(joined_text).collect();
        let index = TfidfIndex::fit(&docs, max_features);

        Corpus { messages, index }
    }

    /// Number of indexed (non-empty) documents.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Rank the corpus against `query`, returning at most `k` candidates
    /// in descending score order.
    ///
    /// Degenerate cases — empty or whitespace query, empty corpus, no
    /// fitted vocabulary — return an empty vector. `k` larger than the
    /// corpus returns everything available.
    pub fn rank(&self, query: &str, k: usize) -> Vec<Candidate> {
        if query.trim().is_empty() || self.messages.is_empty() || self.index.vocabulary.is_empty()
        {
            return Vec::new();
        }

        let query_vec = self.index.transform(query);

        let mut scored: Vec<(usize, f64)> = self
            .index
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i, row.dot(&query_vec)))
            .collect();

        // Stable sort: equal scores keep original corpus order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| Candidate {
                text: joined_text(&self.messages[i]),
                score,
                message: self.messages[i].clone(),
            })
            .collect()
    }
}

/// The indexed form of a message: member name and body joined.
fn joined_text(message: &Message) -> String {
    format!("{} {}", message.member, message.text)
        .trim()
        .to_string()
}
