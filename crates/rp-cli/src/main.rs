use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rp_agents::{Coordinator, PipelineConfig, ResearchRequest};
use rp_core::Credentials;
use rp_providers::{OpenAIImageProvider, OpenAIProvider};
use rp_sources::{PaperSearchConfig, PaperSearchSource, WebSearchConfig, WebSearchSource};

mod config;
mod output;
mod setup;

use config::Config;

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Most verbose: request bodies and raw LLM answers
    Trace,
    /// Verbose: per-source results, chart descriptions
    Debug,
    /// Standard: pipeline stage transitions
    Info,
    /// Quiet: only warnings and errors
    Warn,
    /// Minimal: only errors
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "rp")]
#[command(author, version, about = "Research a topic and turn it into social posts", long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Enable debug logging (shorthand for --log-level debug)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Write logs to file (JSON-lines format)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Config file (defaults to ~/.config/rp/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API key for the LLM and image provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    /// API key for web search
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true, global = true)]
    pub serpapi_api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Research a topic: search, summarize, and write posts
    Research(ResearchArgs),
    /// Show current configuration
    Config,
    /// Initialize the configuration file in ~/.config/rp
    Setup,
}

#[derive(Args)]
struct ResearchArgs {
    /// Topic to research
    topic: String,

    /// Tone of the generated posts (overrides config)
    #[arg(long)]
    tone: Option<String>,

    /// Number of posts to generate (overrides config)
    #[arg(short = 'n', long)]
    posts: Option<usize>,

    /// Generate illustrative images
    #[arg(long)]
    images: bool,

    /// Number of images to request (clamped to the provider cap)
    #[arg(long, default_value_t = 1)]
    image_count: usize,

    /// Return images as inline base64 payloads instead of hosted URLs
    #[arg(long)]
    download: bool,

    /// Generate a chart from the summary
    #[arg(long)]
    graphs: bool,

    /// Directory to save charts and images into
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Resolve log level: --debug overrides --log-level
    let log_level = if cli.debug {
        LogLevel::Debug
    } else {
        cli.log_level
    };

    let filter = EnvFilter::new(log_level.as_filter());

    if let Some(log_path) = &cli.log_file {
        // Log file specified: write JSON to file
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::sync::Mutex::new(file)))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    // Handle setup before config is loaded
    if matches!(&cli.command, Commands::Setup) {
        return setup::run(cli.config.as_deref());
    }

    let config = Config::load(cli.config.as_deref())?;
    let credentials = Credentials::new(cli.openai_api_key.clone(), cli.serpapi_api_key.clone());

    match &cli.command {
        Commands::Research(args) => research(args, &config.pipeline, &credentials).await,
        Commands::Config => show_config(&config, &credentials),
        Commands::Setup => unreachable!(),
    }
}

fn build_coordinator(pipeline: &PipelineConfig) -> Coordinator {
    let timeout = pipeline.request_timeout();

    let mut llm = OpenAIProvider::new()
        .with_timeout(timeout)
        .with_default_model(&pipeline.llm.model);
    let mut images = OpenAIImageProvider::new().with_timeout(timeout);
    if let Some(base_url) = &pipeline.llm.base_url {
        llm = llm.with_base_url(base_url);
        images = images.with_base_url(base_url);
    }

    let mut web_config = WebSearchConfig::default()
        .with_max_results(pipeline.sources.max_web_results)
        .with_timeout(timeout);
    if let Some(base_url) = &pipeline.sources.web_base_url {
        web_config = web_config.with_base_url(base_url);
    }

    let mut paper_config = PaperSearchConfig::default()
        .with_max_results(pipeline.sources.max_paper_results)
        .with_timeout(timeout);
    if let Some(base_url) = &pipeline.sources.paper_base_url {
        paper_config = paper_config.with_base_url(base_url);
    }

    Coordinator::new(
        Arc::new(llm),
        Arc::new(images),
        Arc::new(WebSearchSource::new(web_config)),
        Arc::new(PaperSearchSource::new(paper_config)),
        pipeline,
    )
}

async fn research(
    args: &ResearchArgs,
    pipeline: &PipelineConfig,
    credentials: &Credentials,
) -> Result<()> {
    if credentials.search.is_none() {
        eprintln!("Note: SERPAPI_API_KEY is not set, web search will be skipped.");
    }

    let mut request = ResearchRequest::new(&args.topic);
    if let Some(tone) = &args.tone {
        request = request.with_tone(tone);
    }
    if let Some(count) = args.posts {
        request = request.with_post_count(count);
    }
    if args.images {
        request = request.with_images(args.image_count, args.download);
    }
    if args.graphs {
        request = request.with_graphs();
    }

    let coordinator = build_coordinator(pipeline);
    let result = coordinator
        .run(&request, credentials)
        .await
        .context("Research failed")?;

    if let Some(dir) = &args.output {
        let downloader = OpenAIImageProvider::new().with_timeout(pipeline.request_timeout());
        let written = output::save_artifacts(dir, &result, &downloader).await?;
        for path in &written {
            info!(path = %path.display(), "Saved artifact");
        }
        eprintln!("Saved {} file(s) to {}", written.len(), dir.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", output::render_text(&result));
    }

    Ok(())
}

fn show_config(config: &Config, credentials: &Credentials) -> Result<()> {
    let key_status = |present: bool| if present { "set" } else { "not set" };

    println!("Config file: {}", config.path.display());
    if !config.file_found {
        println!("  (not found, using defaults; run `rp setup` to create it)");
    }
    println!("OPENAI_API_KEY: {}", key_status(credentials.llm.is_some()));
    println!("SERPAPI_API_KEY: {}", key_status(credentials.search.is_some()));
    println!();
    println!("{}", config.to_toml()?);

    Ok(())
}
