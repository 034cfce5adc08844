//! rp-sources: Search agents for research-posts
//!
//! Each agent wraps one external search API and normalizes its results into
//! `SourceRecord`s:
//! - Web: SerpAPI (Google engine), requires a search API key
//! - Papers: the public arXiv Atom API

pub mod arxiv;
pub mod web;

pub use arxiv::{PaperSearchConfig, PaperSearchSource};
pub use web::{WebSearchConfig, WebSearchSource};

/// Default number of results requested from each provider.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Collapse runs of whitespace (including newlines) into single spaces.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
