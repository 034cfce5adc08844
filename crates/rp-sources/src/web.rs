//! Web search through SerpAPI.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use rp_core::{Credentials, Error, SourceAgent, SourceKind, SourceRecord, StageError};
use rp_providers::http::{build_client, transport_error};

use crate::{normalize_whitespace, DEFAULT_MAX_RESULTS};

// =============================================================================
// Web Search Configuration
// =============================================================================

/// Configuration for the SerpAPI-backed web search
#[derive(Clone, Debug)]
pub struct WebSearchConfig {
    /// Base URL of the search API (e.g., "https://serpapi.com")
    pub base_url: String,
    /// SerpAPI engine name (e.g., "google")
    pub engine: String,
    /// Result cap, sent to the provider as `num`
    pub max_results: usize,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://serpapi.com".to_string(),
            engine: "google".to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: Duration::from_secs(30),
        }
    }
}

impl WebSearchConfig {
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

// =============================================================================
// Web Search Source
// =============================================================================

pub struct WebSearchSource {
    client: Client,
    config: WebSearchConfig,
}

impl Default for WebSearchSource {
    fn default() -> Self {
        Self::new(WebSearchConfig::default())
    }
}

impl WebSearchSource {
    pub fn new(config: WebSearchConfig) -> Self {
        Self {
            client: build_client(config.timeout),
            config,
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

/// Normalize a SerpAPI response body into at most `max_results` records.
fn parse_search_response(
    status: u16,
    body: &str,
    max_results: usize,
) -> Result<Vec<SourceRecord>, StageError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| StageError::parse(format!("Failed to parse search response: {}", e)))?;

    if let Some(message) = response.error {
        // "Google hasn't returned any results" is reported as an error with no hits
        if message.contains("hasn't returned any results") {
            return Ok(Vec::new());
        }
        return Err(StageError::Provider(Error::api(status, message)));
    }

    Ok(response
        .organic_results
        .into_iter()
        .filter_map(|result| {
            let title = normalize_whitespace(result.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                return None;
            }
            let snippet = normalize_whitespace(result.snippet.as_deref().unwrap_or_default());
            let record = SourceRecord::web(title, snippet);
            Some(match result.link {
                Some(link) => record.with_link(link),
                None => record,
            })
        })
        .take(max_results)
        .collect())
}

#[async_trait]
impl SourceAgent for WebSearchSource {
    fn name(&self) -> &str {
        "web_search"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    async fn search(
        &self,
        topic: &str,
        credentials: &Credentials,
    ) -> Result<Vec<SourceRecord>, StageError> {
        let api_key = credentials.search_for_stage()?;
        if self.config.max_results == 0 {
            return Ok(Vec::new());
        }

        debug!(topic = %topic, engine = %self.config.engine, "Searching web");
        let num = self.config.max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.config.base_url))
            .query(&[
                ("q", topic),
                ("api_key", api_key.expose()),
                ("engine", self.config.engine.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            // SerpAPI reports failures as {"error": "..."} with a non-2xx status
            return Err(match parse_search_response(status.as_u16(), &body, 0) {
                Err(e @ StageError::Provider(_)) => e,
                _ => StageError::Provider(Error::api(status.as_u16(), body)),
            });
        }

        parse_search_response(status.as_u16(), &body, self.config.max_results)
    }
}
