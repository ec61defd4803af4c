//! # Member QA
//!
//! **A retrieval-and-answer service for natural-language questions over
//! member messages.**
//!
//! Member QA keeps a local snapshot of an upstream message feed, indexes
//! it with TF-IDF, and answers questions like *"When is Layla planning
//! her trip to London?"* by ranking messages against the question and
//! extracting a templated answer from the best candidates.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Upstream  │──▶│ MessageSource │──▶│ CorpusCache │
//! │  API/JSON  │   │ (paginated)  │   │ TTL+single- │
//! └────────────┘   └──────┬───────┘   │   flight    │
//!                         │           └──────┬──────┘
//!                   local snapshot           │ Arc<Corpus>
//!                                            ▼
//!                              rank ▶ filter ▶ answer
//!                                            │
//!                            ┌───────────────┤
//!                            ▼               ▼
//!                       ┌─────────┐    ┌──────────┐
//!                       │   CLI   │    │   HTTP   │
//!                       │  (mqa)  │    │  (axum)  │
//!                       └─────────┘    └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing with defaults |
//! | [`snapshot`] | Persisted snapshot read/write (atomic replace) |
//! | [`source`] | `MessageSource` trait and the paginating HTTP source |
//! | [`cache`] | TTL-refreshed corpus cache with single-flight rebuild |
//! | [`server`] | HTTP API: `GET /ask`, `GET /health` |
//! | [`stats`] | Corpus summary for `mqa stats` |
//!
//! The pure question-answering pipeline (index, intent, extraction,
//! filtering, synthesis) lives in the `member-qa-core` crate.

pub mod cache;
pub mod config;
pub mod server;
pub mod snapshot;
pub mod source;
pub mod stats;

pub use cache::CorpusCache;
pub use config::Config;
pub use source::{HttpMessageSource, MessageSource};
