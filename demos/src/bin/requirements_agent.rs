use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use elicit_agent::{AgentConfig, RequirementsAgent, RunOptions};
use elicit_graph::TracingObserver;
use elicit_llm::{LlmGeneration, OpenAiCompatibleClient};
use tracing_subscriber::EnvFilter;

/// Generate a requirements document by interviewing synthetic personas.
#[derive(Parser, Debug)]
#[command(name = "requirements_agent")]
struct Args {
    /// The application or product to gather requirements for.
    #[arg(long)]
    task: String,

    /// Personas generated per round.
    #[arg(long)]
    k: Option<usize>,

    /// Maximum number of persona rounds.
    #[arg(long = "max-iterations")]
    max_iterations: Option<u32>,

    /// TOML file with agent settings; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the document here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, env = "ELICIT_BASE_URL", default_value = "https://api.openai.com/v1")]
    base_url: String,

    #[arg(long, env = "ELICIT_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Log every workflow step with its delta.
    #[arg(long)]
    trace_steps: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            AgentConfig::from_toml_str(&source)?
        }
        None => AgentConfig::default(),
    };
    if let Some(k) = args.k {
        config.persona_batch_size = k;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.iteration_ceiling = max_iterations;
    }

    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;
    let client = OpenAiCompatibleClient::builder()
        .base_url(&args.base_url)?
        .api_key(api_key)
        .default_model(&args.model)
        .temperature(0.0)
        .build()?;
    let generation = LlmGeneration::new(client).with_concurrency(config.max_concurrency);

    let agent = RequirementsAgent::new(Arc::new(generation), config)?;
    let options = RunOptions {
        observer: args
            .trace_steps
            .then(|| Arc::new(TracingObserver) as Arc<dyn elicit_graph::Observer>),
        ..RunOptions::default()
    };

    let document = agent.run_with_options(&args.task, options).await?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "requirements document written");
        }
        None => println!("{document}"),
    }
    Ok(())
}
