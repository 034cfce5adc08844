//! Source records and the agent trait that produces them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::credentials::Credentials;
use crate::error::StageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Paper,
}

impl SourceKind {
    /// Tag used when the record is shown to the LLM.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Web => "[Web Article]",
            SourceKind::Paper => "[Research Paper]",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Web => write!(f, "web"),
            SourceKind::Paper => write!(f, "paper"),
        }
    }
}

/// One normalized search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl SourceRecord {
    pub fn web(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Web,
            title: title.into(),
            summary: summary.into(),
            link: None,
        }
    }

    pub fn paper(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Paper,
            title: title.into(),
            summary: summary.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        let link = link.into();
        self.link = if link.trim().is_empty() { None } else { Some(link) };
        self
    }

    /// The link, if present and non-empty.
    pub fn reference_link(&self) -> Option<&str> {
        self.link.as_deref().filter(|l| !l.trim().is_empty())
    }
}

/// A search backend that turns a topic into source records.
///
/// Implementors provide `search`; callers use `run`, which never fails.
#[async_trait]
pub trait SourceAgent: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    async fn search(
        &self,
        topic: &str,
        credentials: &Credentials,
    ) -> Result<Vec<SourceRecord>, StageError>;

    /// Search, converting every failure into an empty list.
    async fn run(&self, topic: &str, credentials: &Credentials) -> Vec<SourceRecord> {
        match self.search(topic, credentials).await {
            Ok(records) => {
                info!(
                    source = self.name(),
                    kind = %self.kind(),
                    count = records.len(),
                    "Fetched source records"
                );
                records
            }
            Err(StageError::MissingCredential(which)) => {
                warn!(
                    source = self.name(),
                    kind = %self.kind(),
                    credential = which,
                    "No API key configured, skipping source"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(
                    source = self.name(),
                    kind = %self.kind(),
                    error_kind = e.kind(),
                    error = %e,
                    "Source search failed"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization() {
        let record = SourceRecord::web("Title", "Snippet").with_link("https://example.com");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "web");
        assert_eq!(json["link"], "https://example.com");

        let paper = SourceRecord::paper("P", "Abstract");
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["type"], "paper");
        assert!(json.get("link").is_none());
    }

    #[test]
    fn test_blank_link_dropped() {
        let record = SourceRecord::web("T", "S").with_link("  ");
        assert_eq!(record.link, None);
        assert_eq!(record.reference_link(), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(SourceKind::Web.label(), "[Web Article]");
        assert_eq!(SourceKind::Paper.label(), "[Research Paper]");
    }

    struct FailingSource;

    #[async_trait]
    impl SourceAgent for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn kind(&self) -> SourceKind {
            SourceKind::Web
        }

        async fn search(
            &self,
            _topic: &str,
            _credentials: &Credentials,
        ) -> Result<Vec<SourceRecord>, StageError> {
            Err(StageError::parse("truncated body"))
        }
    }

    struct PaperSource;

    #[async_trait]
    impl SourceAgent for PaperSource {
        fn name(&self) -> &str {
            "papers"
        }

        fn kind(&self) -> SourceKind {
            SourceKind::Paper
        }

        async fn search(
            &self,
            topic: &str,
            _credentials: &Credentials,
        ) -> Result<Vec<SourceRecord>, StageError> {
            Ok(vec![SourceRecord::paper(topic, "Abstract")])
        }
    }

    #[tokio::test]
    async fn test_run_swallows_errors() {
        assert_eq!(FailingSource.kind(), SourceKind::Web);
        let records = FailingSource.run("anything", &Credentials::default()).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_run_passes_records_through() {
        assert_eq!(PaperSource.kind().to_string(), "paper");
        let records = PaperSource.run("qubits", &Credentials::default()).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "qubits");
        assert_eq!(records[0].kind, SourceKind::Paper);
    }
}
