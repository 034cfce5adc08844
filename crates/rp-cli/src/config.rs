use anyhow::{Context, Result};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use std::path::{Path, PathBuf};

use rp_agents::PipelineConfig;

/// Environment variable prefix for config overrides, e.g. `RP_LLM__MODEL`.
const ENV_PREFIX: &str = "RP_";

/// Resolved configuration and where it came from.
#[derive(Debug, Clone)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub path: PathBuf,
    pub file_found: bool,
}

impl Config {
    /// Load from the default location, or from `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        Self::load_from(&path)
    }

    /// Layer the TOML file (if present) under `RP_` environment variables.
    ///
    /// API keys are deliberately absent from `PipelineConfig`; a stray
    /// `api_key` entry in the file is ignored.
    pub fn load_from(path: &Path) -> Result<Self> {
        let pipeline: PipelineConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        Ok(Self {
            pipeline,
            path: path.to_path_buf(),
            file_found: path.exists(),
        })
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("rp"))
    }

    /// The resolved configuration as TOML, for `rp config`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.pipeline).context("Failed to render configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_agents::MergeOrder;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(!config.file_found);
        assert_eq!(config.pipeline.llm.model, "gpt-4o");
        assert_eq!(config.pipeline.posts.count, 3);
        assert_eq!(config.pipeline.merge_order, MergeOrder::WebFirst);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                request_timeout_secs = 20
                merge_order = "papers-first"

                [llm]
                model = "gpt-4o-mini"
                api_key = "sk-should-be-ignored"

                [posts]
                tone = "casual"
                count = 5

                [charts]
                width = 640
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.file_found);
        assert_eq!(config.pipeline.request_timeout_secs, 20);
        assert_eq!(config.pipeline.merge_order, MergeOrder::PapersFirst);
        assert_eq!(config.pipeline.llm.model, "gpt-4o-mini");
        assert_eq!(config.pipeline.posts.tone, "casual");
        assert_eq!(config.pipeline.posts.count, 5);
        assert_eq!(config.pipeline.charts.width, 640);
        assert_eq!(config.pipeline.charts.height, 800);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "merge_order = \"sideways\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_render_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.toml")).unwrap();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("request_timeout_secs = 60"));
        assert!(rendered.contains("[llm]"));
        assert!(!rendered.contains("api_key"));
    }
}
