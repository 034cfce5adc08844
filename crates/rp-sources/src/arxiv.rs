//! Academic paper search through the public arXiv API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use rp_core::{Credentials, Error, SourceAgent, SourceKind, SourceRecord, StageError};
use rp_providers::http::{build_client, transport_error};

use crate::{normalize_whitespace, DEFAULT_MAX_RESULTS};

/// Configuration for the arXiv paper search
#[derive(Clone, Debug)]
pub struct PaperSearchConfig {
    /// Base URL of the arXiv export API (e.g., "https://export.arxiv.org")
    pub base_url: String,
    /// Result cap, sent to the provider as `max_results`
    pub max_results: usize,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for PaperSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://export.arxiv.org".to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: Duration::from_secs(30),
        }
    }
}

impl PaperSearchConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct PaperSearchSource {
    client: Client,
    config: PaperSearchConfig,
}

impl Default for PaperSearchSource {
    fn default() -> Self {
        Self::new(PaperSearchConfig::default())
    }
}

impl PaperSearchSource {
    pub fn new(config: PaperSearchConfig) -> Self {
        Self {
            client: build_client(config.timeout),
            config,
        }
    }
}

// Atom feed subset; everything else in the document is ignored.

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    title: String,
    #[serde(default)]
    summary: String,
}

/// Parse an arXiv Atom document into at most `max_results` records.
fn parse_feed(xml: &str, max_results: usize) -> Result<Vec<SourceRecord>, StageError> {
    let feed: AtomFeed = quick_xml::de::from_str(xml)
        .map_err(|e| StageError::parse(format!("Failed to parse arXiv feed: {}", e)))?;

    // arXiv reports bad queries as a single entry under /api/errors
    if let Some(error) = feed.entries.iter().find(|e| e.id.contains("/api/errors")) {
        return Err(StageError::Provider(Error::invalid_request(
            normalize_whitespace(&error.summary),
        )));
    }

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| {
            SourceRecord::paper(
                normalize_whitespace(&entry.title),
                normalize_whitespace(&entry.summary),
            )
            .with_link(entry.id.trim())
        })
        .take(max_results)
        .collect())
}

#[async_trait]
impl SourceAgent for PaperSearchSource {
    fn name(&self) -> &str {
        "paper_search"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Paper
    }

    async fn search(
        &self,
        topic: &str,
        _credentials: &Credentials,
    ) -> Result<Vec<SourceRecord>, StageError> {
        if self.config.max_results == 0 {
            return Ok(Vec::new());
        }

        debug!(topic = %topic, "Searching arXiv");
        let search_query = format!("all:{}", topic);
        let max_results = self.config.max_results.to_string();
        let response = self
            .client
            .get(format!("{}/api/query", self.config.base_url))
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(StageError::Provider(Error::api(status.as_u16(), body)));
        }

        parse_feed(&body, self.config.max_results)
    }
}
