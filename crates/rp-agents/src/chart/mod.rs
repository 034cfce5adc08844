//! Graph generator stage: the LLM describes a chart, we validate and render it.

mod render;
mod spec;

pub use render::render_chart;
pub use spec::{ChartKind, ChartSpec};

use std::sync::Arc;

use tracing::{debug, info, warn};

use rp_core::{
    run_blocking, ChartImage, CompletionRequest, Credentials, Message, Provider, StageError,
};

use crate::config::{ChartConfig, LlmSettings};
use crate::summarizer::strip_references;

const SYSTEM_PROMPT: &str = "You are a data visualization expert. Generate graph data in JSON \
format. The JSON object must include the fields \"title\", \"x_label\", \"y_label\", \"x_data\", \
\"y_data\", and optionally \"type\" (one of \"line\", \"bar\", \"scatter\"). \"x_data\" and \
\"y_data\" must have the same length and \"y_data\" must be numeric. Respond with only the JSON \
object.";

pub struct ChartGenerator {
    provider: Arc<dyn Provider>,
    llm: LlmSettings,
    config: ChartConfig,
}

impl ChartGenerator {
    pub fn new(provider: Arc<dyn Provider>, llm: LlmSettings, config: ChartConfig) -> Self {
        Self {
            provider,
            llm,
            config,
        }
    }

    /// Ask for one chart description and render it.
    pub async fn try_generate_graphs(
        &self,
        summary: &str,
        credentials: &Credentials,
    ) -> Result<Vec<ChartImage>, StageError> {
        let api_key = credentials.llm_for_stage()?;

        info!("Generating graphs");
        let request = CompletionRequest::new(vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "Generate a graph description based on this summary: {}",
                strip_references(summary)
            )),
        ])
        .with_model(&self.llm.model)
        .with_temperature(self.llm.temperature);

        let response = self.provider.complete(api_key, request).await?;
        debug!(description = %response.text(), "Graph description");

        let spec = ChartSpec::parse(response.text())?;
        let config = self.config.clone();
        let chart = run_blocking(move || render_chart(&spec, &config)).await??;
        Ok(vec![chart])
    }

    /// Like `try_generate_graphs`, but any failure is logged and yields no charts.
    pub async fn generate_graphs(
        &self,
        summary: &str,
        credentials: &Credentials,
    ) -> Vec<ChartImage> {
        match self.try_generate_graphs(summary, credentials).await {
            Ok(charts) => charts,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Graph generation failed");
                Vec::new()
            }
        }
    }
}
