//! Summarizer stage: merged source records to a prose summary with references.

use std::sync::Arc;

use tracing::{debug, info};

use rp_core::{
    CompletionRequest, Credentials, Error, Message, Provider, SourceRecord,
};

use crate::config::{LlmSettings, SummaryConfig};

const SYSTEM_PROMPT: &str = "You are a helpful research assistant. \
Summarize research for a general audience: clear, concise, accurate, and free of jargon.";

const PROMPT_PREFIX: &str = "Summarize the following research content into a clear, concise \
explanation for a general audience:\n\n";

/// Heading that separates the prose summary from the reference list.
pub const REFERENCES_HEADING: &str = "**References:**";

pub struct Summarizer {
    provider: Arc<dyn Provider>,
    llm: LlmSettings,
    config: SummaryConfig,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn Provider>, llm: LlmSettings, config: SummaryConfig) -> Self {
        Self {
            provider,
            llm,
            config,
        }
    }

    /// Summarize the records and append up to `reference_cap` references.
    ///
    /// Fails with `Error::Config` before any network call when `sources` is
    /// empty or no LLM key is present. Provider errors propagate.
    pub async fn summarize(
        &self,
        sources: &[SourceRecord],
        credentials: &Credentials,
    ) -> Result<String, Error> {
        if sources.is_empty() {
            return Err(Error::config("summarize requires at least one source record"));
        }
        let api_key = credentials.require_llm("summary")?;

        info!(sources = sources.len(), "Summarizing combined research");
        let request = CompletionRequest::new(vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(build_prompt(sources)),
        ])
        .with_model(&self.llm.model)
        .with_temperature(self.llm.temperature);

        let response = self.provider.complete(api_key, request).await?;
        let mut summary = response.text().trim().to_string();

        let references = build_references(sources, self.config.reference_cap);
        debug!(references = references.len(), "Built reference list");

        if summary.is_empty() && references.is_empty() {
            return Err(Error::EmptyCompletion(self.provider.name().to_string()));
        }

        if !references.is_empty() {
            summary.push_str("\n\n");
            summary.push_str(REFERENCES_HEADING);
            summary.push('\n');
            summary.push_str(&references.join("\n"));
        }

        Ok(summary)
    }
}

/// Labeled blocks, one per record, in merge order.
pub fn build_prompt(sources: &[SourceRecord]) -> String {
    let mut prompt = String::from(PROMPT_PREFIX);
    for source in sources {
        let title = if source.title.trim().is_empty() {
            "Untitled"
        } else {
            source.title.as_str()
        };
        prompt.push_str(&format!(
            "{} {}\n{}\n\n",
            source.kind.label(),
            title,
            source.summary
        ));
    }
    prompt
}

/// `N. [title](link)` lines for the first `cap` records that carry a link.
pub fn build_references(sources: &[SourceRecord], cap: usize) -> Vec<String> {
    sources
        .iter()
        .filter_map(|s| s.reference_link().map(|link| (s.title.as_str(), link)))
        .take(cap)
        .enumerate()
        .map(|(i, (title, link))| format!("{}. [{}]({})", i + 1, title, link))
        .collect()
}

/// The prose part of a summary, without the reference list.
pub fn strip_references(summary: &str) -> &str {
    match summary.find(REFERENCES_HEADING) {
        Some(idx) => summary[..idx].trim_end(),
        None => summary.trim_end(),
    }
}
