//! The research coordinator: sources, merge, summary, posts, then the
//! optional image and chart stages.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use rp_core::{
    Credentials, Error, ImageProvider, Provider, ResearchResult, SourceAgent, SourceRecord,
};

use crate::chart::ChartGenerator;
use crate::config::{MergeOrder, PipelineConfig};
use crate::images::ImageGenerator;
use crate::posts::PostGenerator;
use crate::summarizer::Summarizer;

/// Pipeline states, used as the `stage` log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    SourcesGathered,
    ResultsMerged,
    EmptyShortCircuit,
    Summarized,
    PostsGenerated,
    ImagesGenerated,
    GraphsGenerated,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Init => "init",
            PipelineStage::SourcesGathered => "sources_gathered",
            PipelineStage::ResultsMerged => "results_merged",
            PipelineStage::EmptyShortCircuit => "empty_short_circuit",
            PipelineStage::Summarized => "summarized",
            PipelineStage::PostsGenerated => "posts_generated",
            PipelineStage::ImagesGenerated => "images_generated",
            PipelineStage::GraphsGenerated => "graphs_generated",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// One research invocation.
#[derive(Debug, Clone, Default)]
pub struct ResearchRequest {
    pub topic: String,
    /// Post tone; `None` uses the configured tone
    pub tone: Option<String>,
    /// Number of posts; `None` uses the configured count
    pub post_count: Option<usize>,
    pub generate_images: bool,
    pub image_count: usize,
    /// Ask for base64 payloads instead of hosted URLs
    pub images_as_payload: bool,
    pub generate_graphs: bool,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            image_count: 1,
            ..Default::default()
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn with_post_count(mut self, count: usize) -> Self {
        self.post_count = Some(count);
        self
    }

    pub fn with_images(mut self, count: usize, as_payload: bool) -> Self {
        self.generate_images = true;
        self.image_count = count;
        self.images_as_payload = as_payload;
        self
    }

    pub fn with_graphs(mut self) -> Self {
        self.generate_graphs = true;
        self
    }
}

/// Concatenate the two source lists, keeping each list's own order.
pub fn merge_results(
    order: MergeOrder,
    web: Vec<SourceRecord>,
    papers: Vec<SourceRecord>,
) -> Vec<SourceRecord> {
    let (mut first, second) = match order {
        MergeOrder::WebFirst => (web, papers),
        MergeOrder::PapersFirst => (papers, web),
    };
    first.extend(second);
    first
}

pub struct Coordinator {
    web: Arc<dyn SourceAgent>,
    papers: Arc<dyn SourceAgent>,
    summarizer: Summarizer,
    posts: PostGenerator,
    images: ImageGenerator,
    charts: ChartGenerator,
    merge_order: MergeOrder,
    default_tone: String,
    default_post_count: usize,
}

impl Coordinator {
    pub fn new(
        llm: Arc<dyn Provider>,
        images: Arc<dyn ImageProvider>,
        web: Arc<dyn SourceAgent>,
        papers: Arc<dyn SourceAgent>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            web,
            papers,
            summarizer: Summarizer::new(llm.clone(), config.llm.clone(), config.summary.clone()),
            posts: PostGenerator::new(llm.clone(), config.llm.clone()),
            images: ImageGenerator::new(images, config.images.clone()),
            charts: ChartGenerator::new(llm, config.llm.clone(), config.charts.clone()),
            merge_order: config.merge_order,
            default_tone: config.posts.tone.clone(),
            default_post_count: config.posts.count,
        }
    }

    /// Run the whole pipeline for one topic.
    ///
    /// Only a missing LLM key, an empty topic, or a summary/posts failure is
    /// an error. Sources, images and charts degrade to empty lists.
    ///
    /// The LLM key is checked before any source runs, so a request without
    /// one fails with `Error::Config` even when both sources would have come
    /// back empty.
    pub async fn run(
        &self,
        request: &ResearchRequest,
        credentials: &Credentials,
    ) -> Result<ResearchResult, Error> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(Error::invalid_request("Research topic is empty"));
        }
        credentials.require_llm("coordinator")?;
        info!(stage = %PipelineStage::Init, topic = %topic, "Starting research");

        let (web_results, paper_results) = tokio::join!(
            self.web.run(topic, credentials),
            self.papers.run(topic, credentials)
        );
        info!(
            stage = %PipelineStage::SourcesGathered,
            web = web_results.len(),
            papers = paper_results.len(),
            "Fetched source results"
        );

        let combined = merge_results(self.merge_order, web_results, paper_results);
        debug!(stage = %PipelineStage::ResultsMerged, total = combined.len(), "Merged results");

        if combined.is_empty() {
            info!(stage = %PipelineStage::EmptyShortCircuit, "No results found");
            return Ok(ResearchResult::no_results());
        }

        let summary = self.summarizer.summarize(&combined, credentials).await?;
        info!(stage = %PipelineStage::Summarized, chars = summary.len(), "Summary ready");

        let tone = request.tone.as_deref().unwrap_or(&self.default_tone);
        let count = request.post_count.unwrap_or(self.default_post_count);
        let posts = self
            .posts
            .generate_posts(&summary, tone, count, credentials)
            .await?;
        info!(stage = %PipelineStage::PostsGenerated, count = posts.len(), "Posts ready");

        let images = async {
            if !request.generate_images {
                return Vec::new();
            }
            let images = self
                .images
                .generate_images(
                    &summary,
                    request.image_count,
                    request.images_as_payload,
                    credentials,
                )
                .await;
            info!(stage = %PipelineStage::ImagesGenerated, count = images.len(), "Images ready");
            images
        };
        let graphs = async {
            if !request.generate_graphs {
                return Vec::new();
            }
            let graphs = self.charts.generate_graphs(&summary, credentials).await;
            info!(stage = %PipelineStage::GraphsGenerated, count = graphs.len(), "Graphs ready");
            graphs
        };
        let (images, graphs) = futures::future::join(images, graphs).await;

        info!(stage = %PipelineStage::Done, "Research complete");
        Ok(ResearchResult {
            summary,
            posts,
            images,
            graphs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_core::testing::{test_credentials, MockImageProvider, MockProvider, MockSource};
    use rp_core::{ImageRef, Role, SourceKind};

    const BAR_CHART: &str =
        r#"{"title": "T", "x_data": [1, 2, 3], "y_data": [4, 5, 6], "type": "bar"}"#;

    struct Harness {
        llm: Arc<MockProvider>,
        images: Arc<MockImageProvider>,
        web: Arc<MockSource>,
        papers: Arc<MockSource>,
    }

    impl Harness {
        fn new(web: Vec<SourceRecord>, papers: Vec<SourceRecord>) -> Self {
            Self {
                llm: Arc::new(MockProvider::new()),
                images: Arc::new(MockImageProvider::new()),
                web: Arc::new(MockSource::new(SourceKind::Web, web)),
                papers: Arc::new(MockSource::new(SourceKind::Paper, papers)),
            }
        }

        fn coordinator(&self, config: &PipelineConfig) -> Coordinator {
            let mut config = config.clone();
            config.charts.width = 320;
            config.charts.height = 240;
            Coordinator::new(
                self.llm.clone(),
                self.images.clone(),
                self.web.clone(),
                self.papers.clone(),
                &config,
            )
        }
    }

    fn web_records() -> Vec<SourceRecord> {
        vec![
            SourceRecord::web("What is quantum computing?", "Qubits.")
                .with_link("https://example.com/qc"),
            SourceRecord::web("Quantum advantage", "Speedups.")
                .with_link("https://example.com/adv"),
        ]
    }

    fn paper_records() -> Vec<SourceRecord> {
        (1..=3)
            .map(|i| {
                SourceRecord::paper(format!("Paper {}", i), format!("Abstract {}", i))
                    .with_link(format!("http://arxiv.org/abs/{}", i))
            })
            .collect()
    }

    #[test]
    fn test_merge_orders() {
        let web = vec![SourceRecord::web("w", "")];
        let papers = vec![SourceRecord::paper("p", "")];
        let merged = merge_results(MergeOrder::WebFirst, web.clone(), papers.clone());
        assert_eq!(merged[0].kind, SourceKind::Web);
        let merged = merge_results(MergeOrder::PapersFirst, web, papers);
        assert_eq!(merged[0].kind, SourceKind::Paper);
    }

    #[tokio::test]
    async fn test_quantum_computing_flow() {
        let harness = Harness::new(web_records(), paper_records());
        harness.llm.queue_response("Quantum computing in brief.");
        harness.llm.queue_response("1. One\n2. Two\n3. Three");

        let result = harness
            .coordinator(&PipelineConfig::default())
            .run(&ResearchRequest::new("quantum computing"), &test_credentials())
            .await
            .unwrap();

        assert_eq!(harness.web.call_count(), 1);
        assert_eq!(harness.papers.call_count(), 1);
        assert_eq!(harness.llm.request_count(), 2);

        // Summary prompt lists the five records as web x2 then paper x3
        let requests = harness.llm.requests();
        let prompt = requests[0].content_for(Role::User).unwrap();
        let order: Vec<usize> = [
            "[Web Article] What is quantum computing?",
            "[Web Article] Quantum advantage",
            "[Research Paper] Paper 1",
            "[Research Paper] Paper 2",
            "[Research Paper] Paper 3",
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        assert!(result.summary.starts_with("Quantum computing in brief."));
        assert!(result.summary.contains("5. [Paper 3](http://arxiv.org/abs/3)"));
        assert_eq!(result.posts, vec!["One", "Two", "Three"]);
        assert!(result.images.is_empty());
        assert!(result.graphs.is_empty());
        assert_eq!(harness.images.request_count(), 0);
    }

    #[tokio::test]
    async fn test_papers_first() {
        let harness = Harness::new(web_records(), paper_records());
        harness.llm.queue_response("Summary.");
        harness.llm.queue_response("1. Post");

        let config = PipelineConfig {
            merge_order: MergeOrder::PapersFirst,
            ..Default::default()
        };
        harness
            .coordinator(&config)
            .run(
                &ResearchRequest::new("quantum computing").with_post_count(1),
                &test_credentials(),
            )
            .await
            .unwrap();

        let prompt = harness.llm.requests()[0]
            .content_for(Role::User)
            .unwrap()
            .to_string();
        assert!(prompt.find("Paper 3").unwrap() < prompt.find("Quantum advantage").unwrap());
    }

    #[tokio::test]
    async fn test_empty_sources_short_circuit() {
        let harness = Harness::new(Vec::new(), Vec::new());
        let result = harness
            .coordinator(&PipelineConfig::default())
            .run(
                &ResearchRequest::new("nothing").with_images(1, false).with_graphs(),
                &test_credentials(),
            )
            .await
            .unwrap();

        assert!(result.is_no_results());
        assert_eq!(result.summary, "No results found.");
        assert_eq!(harness.llm.request_count(), 0);
        assert_eq!(harness.images.request_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_source_still_summarizes() {
        let harness = Harness {
            web: Arc::new(MockSource::failing(SourceKind::Web, "bad json")),
            ..Harness::new(Vec::new(), paper_records())
        };
        harness.llm.queue_response("Summary.");
        harness.llm.queue_response("1. a\n2. b\n3. c");

        let result = harness
            .coordinator(&PipelineConfig::default())
            .run(&ResearchRequest::new("quantum"), &test_credentials())
            .await
            .unwrap();
        assert_eq!(result.posts.len(), 3);
        assert_eq!(harness.web.call_count(), 1);
    }

    #[tokio::test]
    async fn test_summary_error_propagates() {
        let harness = Harness::new(web_records(), Vec::new());
        harness.llm.queue_error(Error::auth("bad key"));

        let err = harness
            .coordinator(&PipelineConfig::default())
            .run(&ResearchRequest::new("quantum"), &test_credentials())
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
        assert_eq!(harness.llm.request_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_llm_key_fails_before_network() {
        let harness = Harness::new(web_records(), paper_records());
        let credentials = Credentials::default().with_search("serp-test");

        let err = harness
            .coordinator(&PipelineConfig::default())
            .run(&ResearchRequest::new("quantum"), &credentials)
            .await
            .unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(harness.web.call_count(), 0);
        assert_eq!(harness.papers.call_count(), 0);
        assert_eq!(harness.llm.request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_llm_key_wins_over_empty_sources() {
        let harness = Harness::new(Vec::new(), Vec::new());
        let err = harness
            .coordinator(&PipelineConfig::default())
            .run(&ResearchRequest::new("nothing"), &Credentials::default())
            .await
            .unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(harness.web.call_count(), 0);
        assert_eq!(harness.papers.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_topic() {
        let harness = Harness::new(web_records(), paper_records());
        let err = harness
            .coordinator(&PipelineConfig::default())
            .run(&ResearchRequest::new("   "), &test_credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_image_failure_does_not_block_graphs() {
        let harness = Harness::new(web_records(), paper_records());
        harness.llm.queue_response("Summary.");
        harness.llm.queue_response("1. a\n2. b\n3. c");
        harness.llm.queue_response(BAR_CHART);
        harness.images.queue_error(Error::invalid_request("rejected"));

        let result = harness
            .coordinator(&PipelineConfig::default())
            .run(
                &ResearchRequest::new("quantum").with_images(1, false).with_graphs(),
                &test_credentials(),
            )
            .await
            .unwrap();
        assert!(result.images.is_empty());
        assert_eq!(result.graphs.len(), 1);
        assert_eq!(harness.images.request_count(), 1);
    }

    #[tokio::test]
    async fn test_graph_failure_does_not_block_images() {
        let harness = Harness::new(web_records(), paper_records());
        harness.llm.queue_response("Summary.");
        harness.llm.queue_response("1. a\n2. b\n3. c");
        harness
            .llm
            .queue_response(r#"{"x_data": [1], "y_data": [2], "type": "pie"}"#);

        let result = harness
            .coordinator(&PipelineConfig::default())
            .run(
                &ResearchRequest::new("quantum")
                    .with_tone("casual")
                    .with_images(3, false)
                    .with_graphs(),
                &test_credentials(),
            )
            .await
            .unwrap();
        assert!(result.graphs.is_empty());
        // Clamped to the one-image default cap
        assert_eq!(
            result.images,
            vec![ImageRef::Url("https://images.test/0.png".to_string())]
        );
        let posts_prompt = harness.llm.requests()[1]
            .content_for(Role::System)
            .unwrap()
            .to_string();
        assert!(posts_prompt.contains("casual"));
    }
}
