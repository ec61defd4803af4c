//! # Member QA Core
//!
//! Shared, runtime-free logic for Member QA: data models, the TF-IDF
//! retrieval index, intent classification, entity extraction, scope
//! filtering, and answer synthesis.
//!
//! This crate contains no tokio, HTTP, or filesystem I/O. Everything here
//! is a pure, synchronous computation over in-memory values, which keeps
//! the whole question-answering pipeline unit-testable without a server
//! or a network.
//!
//! ## Pipeline
//!
//! ```text
//! question ──▶ intent::classify ─────────────┐
//!          ──▶ extract::member_from_question ─┤
//!          ──▶ extract::location_from_question┤
//!                                             ▼
//! corpus.rank(question, k) ──▶ filter::scope ──▶ answer::answer_question
//! ```
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `Message`, `Candidate`, `ExtractedEntities`, snapshot shapes |
//! | [`index`] | TF-IDF vocabulary fitting, cosine scoring, `Corpus::rank` |
//! | [`intent`] | Ordered keyword intent classifier |
//! | [`extract`] | Regex entity extractors: member, location, date, count, places |
//! | [`filter`] | Scope filter with the never-empty guarantee |
//! | [`answer`] | Per-intent fallback chains producing the answer sentence |

pub mod answer;
pub mod extract;
pub mod filter;
pub mod index;
pub mod intent;
pub mod models;

pub use index::Corpus;
pub use intent::Intent;
pub use models::{Candidate, ExtractedEntities, Message, MessageId, RawMessage, SnapshotDocument};
