//! Configuration types for the pipeline stages.

use serde::{Deserialize, Serialize};

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_reference_cap() -> usize {
    5
}

fn default_post_count() -> usize {
    3
}

fn default_tone() -> String {
    "professional".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_quality() -> String {
    "standard".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_max_per_request() -> usize {
    1
}

fn default_max_prompt_chars() -> usize {
    3500
}

fn default_chart_width() -> u32 {
    1200
}

fn default_chart_height() -> u32 {
    800
}

fn default_max_results() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    60
}

/// Which source's records come first after merging.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MergeOrder {
    #[default]
    WebFirst,
    PapersFirst,
}

/// Model settings shared by every LLM-backed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// OpenAI-compatible endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Maximum number of linked sources listed under References
    #[serde(default = "default_reference_cap")]
    pub reference_cap: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            reference_cap: default_reference_cap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsConfig {
    #[serde(default = "default_post_count")]
    pub count: usize,

    #[serde(default = "default_tone")]
    pub tone: String,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            count: default_post_count(),
            tone: default_tone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_model")]
    pub model: String,

    #[serde(default = "default_image_quality")]
    pub quality: String,

    #[serde(default = "default_image_size")]
    pub size: String,

    /// Provider cap on images per request; larger counts are clamped
    #[serde(default = "default_max_per_request")]
    pub max_per_request: usize,

    /// Summary text beyond this many characters is cut from the prompt
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            model: default_image_model(),
            quality: default_image_quality(),
            size: default_image_size(),
            max_per_request: default_max_per_request(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_width")]
    pub width: u32,

    #[serde(default = "default_chart_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_max_results")]
    pub max_web_results: usize,

    #[serde(default = "default_max_results")]
    pub max_paper_results: usize,

    /// SerpAPI endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_base_url: Option<String>,

    /// arXiv endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_base_url: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            max_web_results: default_max_results(),
            max_paper_results: default_max_results(),
            web_base_url: None,
            paper_base_url: None,
        }
    }
}

/// Full pipeline configuration (the `config.toml` body).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Timeout applied to every remote call
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub merge_order: MergeOrder,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub summary: SummaryConfig,

    #[serde(default)]
    pub posts: PostsConfig,

    #[serde(default)]
    pub images: ImageConfig,

    #[serde(default)]
    pub charts: ChartConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout_secs(),
            merge_order: MergeOrder::default(),
            llm: LlmSettings::default(),
            sources: SourcesConfig::default(),
            summary: SummaryConfig::default(),
            posts: PostsConfig::default(),
            images: ImageConfig::default(),
            charts: ChartConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
