use std::path::PathBuf;

use clap::Parser;
use esg_core::Result;
use esg_inference::{create_oracles, Config, InferenceConfig};
use esg_pipeline::cli::{handle_command, PipelineCommands};
use esg_pipeline::{init_logging, PipelineConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "ESG media analysis over news search results", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "gemini", help = "Model to use for inference. Available models: gemini (default), dummy")]
    model: String,
    #[arg(long)]
    model_url: Option<String>,
    #[arg(long)]
    chat_model: Option<String>,
    #[arg(long)]
    embedding_model: Option<String>,
    /// API key for the model; falls back to GEMINI_API_KEY
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// JSON file with pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, short)]
    verbose: bool,
    #[command(subcommand)]
    command: PipelineCommands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let pipeline_config = match &cli.config {
        Some(path) => {
            info!("⚙️ Loading pipeline config from {}", path.display());
            PipelineConfig::load(path)?
        }
        None => PipelineConfig::default(),
    };

    let oracles = create_oracles(Some(Config {
        api_key: cli.api_key,
        model_name: Some(cli.model),
        inference_config: InferenceConfig {
            model_url: cli.model_url,
            chat_model: cli.chat_model,
            embedding_model: cli.embedding_model,
        },
    }))?;
    info!("🧠 Using oracles {:?}", oracles);

    handle_command(cli.command, oracles, pipeline_config).await
}
