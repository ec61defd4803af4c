//! TOML configuration parsing.
//!
//! Every setting has a default, so the service runs with no config file
//! at all; a file only needs to name the settings it overrides.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [source]
//! base_url = "https://messages.example.com/messages/"
//! page_limit = 100
//! page_delay_ms = 200
//! timeout_secs = 30
//!
//! [cache]
//! ttl_secs = 1800
//! snapshot_path = "data/messages_fetch_full.json"
//! fallback_paths = ["data/messages_full.json", "data/messages.json"]
//!
//! [retrieval]
//! top_k = 6
//! max_features = 50000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use member_qa_core::index::DEFAULT_MAX_FEATURES;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address for the HTTP API.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Upstream messages endpoint, paginated with `skip`/`limit`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Initial page size; halved on client errors down to 1.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    /// Pause between page requests, to stay under upstream throttling.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Per-request transport timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            page_delay_ms: default_page_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Corpus freshness window. A refresh runs at most once per window.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Primary snapshot written by the crawler and seeded at cold start.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    /// Older dumps tried, in order, when the primary is missing.
    #[serde(default = "default_fallback_paths")]
    pub fallback_paths: Vec<PathBuf>,
}

impl CacheConfig {
    /// All snapshot paths in seeding priority order: primary first.
    pub fn snapshot_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.snapshot_path.clone()];
        paths.extend(self.fallback_paths.iter().cloned());
        paths
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            snapshot_path: default_snapshot_path(),
            fallback_paths: default_fallback_paths(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Candidates handed to the answer synthesizer per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Vocabulary cap for the TF-IDF fit.
    #[serde(default = "default_max_features")]
    pub max_features: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_features: default_max_features(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_base_url() -> String {
    "https://november7-730026606190.europe-west1.run.app/messages/".to_string()
}
fn default_page_limit() -> usize {
    100
}
fn default_page_delay_ms() -> u64 {
    200
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_ttl_secs() -> u64 {
    // Read-heavy cache: refresh every 30 minutes.
    30 * 60
}
fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/messages_fetch_full.json")
}
fn default_fallback_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("data/messages_full.json"),
        PathBuf::from("data/messages.json"),
    ]
}
fn default_top_k() -> usize {
    6
}
fn default_max_features() -> usize {
    DEFAULT_MAX_FEATURES
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error — the built-in defaults apply, so
    /// `mqa serve` works out of the box. A file that exists but fails to
    /// parse is an error; silently ignoring a typo'd config would be
    /// worse than refusing to start.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}
