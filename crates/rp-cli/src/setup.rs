use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;

const CONFIG_TEMPLATE: &str = r#"# rp configuration
#
# API keys are never read from this file. Set them in the environment:
#   OPENAI_API_KEY    LLM and image generation
#   SERPAPI_API_KEY   web search (optional; papers still work without it)
#
# Any value below can also be overridden with RP_-prefixed variables,
# using "__" between sections, e.g. RP_LLM__MODEL=gpt-4o-mini

# Timeout for every remote call, in seconds
request_timeout_secs = 60

# Which source comes first in the summary prompt: "web-first" or "papers-first"
merge_order = "web-first"

[llm]
model = "gpt-4o"
temperature = 0.5
# base_url = "https://api.openai.com/v1"

[sources]
max_web_results = 5
max_paper_results = 5

[summary]
reference_cap = 5

[posts]
count = 3
tone = "professional"

[images]
model = "dall-e-3"
quality = "standard"
size = "1024x1024"
max_per_request = 1

[charts]
width = 1200
height = 800
"#;

pub fn run(path: Option<&Path>) -> Result<()> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::config_path()?,
    };

    if let Some(config_dir) = config_path.parent() {
        std::fs::create_dir_all(config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
    }

    if config_path.exists() {
        println!("Existing config file found:");
        println!("  {}", config_path.display());
        print!("\nOverwrite? (The existing file will be backed up) [y/N] ");

        use std::io::Write;
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Setup cancelled.");
            return Ok(());
        }

        backup_file(&config_path)?;
    }

    write_template(&config_path)?;
    println!("Created {}", config_path.display());

    println!("\nNext steps:");
    println!("  1. Set your API keys: export OPENAI_API_KEY=\"sk-...\" SERPAPI_API_KEY=\"...\"");
    println!("  2. Run some research: rp research \"quantum computing\"");

    Ok(())
}

fn write_template(path: &Path) -> Result<()> {
    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Back up a file to <name>.bak, appending a timestamp if .bak already exists.
fn backup_file(path: &Path) -> Result<()> {
    let mut backup = path.with_extension("toml.bak");

    if backup.exists() {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        backup = path.with_extension(format!("toml.bak.{}", timestamp));
    }

    std::fs::rename(path, &backup)
        .with_context(|| format!("Failed to back up {} to {}", path.display(), backup.display()))?;
    println!("  Backed up to {}", backup.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_template(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.file_found);
        assert_eq!(config.pipeline.llm.model, "gpt-4o");
        assert_eq!(config.pipeline.images.max_per_request, 1);
        assert_eq!(config.pipeline.charts.width, 1200);
    }

    #[test]
    fn test_backup_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "first").unwrap();
        backup_file(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("config.toml.bak")).unwrap(),
            "first"
        );

        // A second backup gets a timestamped name instead of clobbering .bak
        std::fs::write(&path, "second").unwrap();
        backup_file(&path).unwrap();
        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("config.toml.bak."))
            .count();
        assert_eq!(backups, 1);
    }
}
