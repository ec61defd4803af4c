//! Message Store Adapter: where the current message set comes from.
//!
//! The corpus cache only depends on the [`MessageSource`] trait — "give
//! me the best-available current message set" — so tests can plug in
//! stubs and the retry/pagination policy stays contained here.
//!
//! [`HttpMessageSource`] crawls the upstream `/messages/` endpoint with
//! `skip`/`limit` pagination:
//!
//! - resumes from the persisted snapshot, deduplicating by message id;
//! - on a 2xx page, accepts either payload shape (bare array or
//!   `{total, items}` envelope);
//! - stops on an empty page or once the advertised `total` is reached;
//! - on 400/401/402/403/404/405 halves the page size (floor 1) and
//!   retries, giving up with what it has once even `limit=1` fails;
//! - any other failure aborts the fetch with an error (the cache treats
//!   that as "source unavailable" and keeps serving the old corpus).
//!
//! A successful crawl is persisted back to the snapshot path so the next
//! cold start can seed from it.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use member_qa_core::models::{MessageId, RawMessage, SnapshotDocument};

use crate::config::SourceConfig;
use crate::snapshot;

/// Supplies the current set of message records.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch the best-available current message set.
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>>;
}

/// Client-error statuses that trigger page-size halving. The upstream
/// rejects large pages this way under throttling.
const RETRYABLE_CLIENT_ERRORS: &[u16] = &[400, 401, 402, 403, 404, 405];

/// Paginating HTTP source for the upstream messages API.
pub struct HttpMessageSource {
    client: reqwest::Client,
    base_url: String,
    page_limit: usize,
    page_delay: Duration,
    /// Snapshot to resume from and persist to; `None` disables both.
    snapshot_path: Option<PathBuf>,
}

impl HttpMessageSource {
    pub fn new(config: &SourceConfig, snapshot_path: Option<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            page_limit: config.page_limit.max(1),
            page_delay: Duration::from_millis(config.page_delay_ms),
            snapshot_path,
        })
    }

    /// Crawl all pages, starting after any resumable snapshot contents.
    async fn crawl(&self) -> Result<(Option<u64>, Vec<RawMessage>)> {
        let mut collected: Vec<RawMessage> = match &self.snapshot_path {
            Some(path) if path.exists() => snapshot::load(path).unwrap_or_default(),
            _ => Vec::new(),
        };
        if !collected.is_empty() {
            debug!("Resuming crawl with {} cached messages", collected.len());
        }

        let mut seen: HashSet<MessageId> = collected.iter().filter_map(|m| m.id.clone()).collect();
        let mut skip = collected.len();
        let mut limit = self.page_limit;
        let mut total: Option<u64> = None;

        loop {
            let response = self
                .client
                .get(&self.base_url)
                .query(&[("skip", skip), ("limit", limit)])
                .send()
                .await
                .context("Messages request failed")?;

            let status = response.status();

            if status.is_success() {
                let page: SnapshotDocument = response
                    .json()
                    .await
                    .context("Unrecognized messages payload")?;
                total = page.total().or(total);
                let chunk = page.into_items();

                if chunk.is_empty() {
                    debug!("Empty page at skip={}; crawl complete", skip);
                    break;
                }

                let page_len = chunk.len();
                for msg in chunk {
                    if let Some(id) = &msg.id {
                        if !seen.insert(id.clone()) {
                            continue;
                        }
                    }
                    collected.push(msg);
                }

                if let Some(total) = total {
                    if collected.len() as u64 >= total {
                        break;
                    }
                }

                skip += page_len;
                tokio::time::sleep(self.page_delay).await;
                continue;
            }

            if RETRYABLE_CLIENT_ERRORS.contains(&status.as_u16()) {
                if limit > 1 {
                    limit = (limit / 2).max(1);
                    debug!("Got {}; retrying with limit={}", status, limit);
                    tokio::time::sleep(self.page_delay).await;
                    continue;
                }
                warn!("Received {} even at limit=1; stopping early", status);
                break;
            }

            bail!("Messages endpoint returned {}", status);
        }

        Ok((total, collected))
    }
}

#[async_trait]
impl MessageSource for HttpMessageSource {
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>> {
        let (total, collected) = self.crawl().await?;
        info!("Fetched {} messages from upstream", collected.len());

        if let Some(path) = &self.snapshot_path {
            // Persisting is best-effort; a read-only disk must not turn
            // a successful fetch into a failed refresh.
            if let Err(err) = snapshot::write(path, total, &collected) {
                warn!("Failed to persist snapshot: {:#}", err);
            }
        }

        Ok(collected)
    }
}
