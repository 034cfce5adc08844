//! Pipeline stages and the coordinator for research-posts.
//!
//! This crate provides:
//! - `Summarizer`, `PostGenerator`, `ImageGenerator` and `ChartGenerator` stages
//! - `Coordinator` which runs the sources and stages for one topic
//! - Configuration types loaded from `config.toml`

mod chart;
mod config;
mod coordinator;
mod images;
mod posts;
mod summarizer;

pub use chart::{render_chart, ChartGenerator, ChartKind, ChartSpec};
pub use config::{
    ChartConfig, ImageConfig, LlmSettings, MergeOrder, PipelineConfig, PostsConfig,
    SourcesConfig, SummaryConfig,
};
pub use coordinator::{merge_results, Coordinator, PipelineStage, ResearchRequest};
pub use images::{build_image_prompt, ImageGenerator};
pub use posts::{parse_posts, PostGenerator};
pub use summarizer::{build_references, strip_references, Summarizer, REFERENCES_HEADING};
