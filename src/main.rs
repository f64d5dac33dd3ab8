use anyhow::Result;
use clap::Parser;
use multiturn_qa_generator::ai::Provider;
use multiturn_qa_generator::app::{App, BatchMode};
use multiturn_qa_generator::models::{Config, GenerationOptions};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "multiturn-qa-generator")]
#[command(about = "Generate multi-turn QA dialogues from images")]
struct CliArgs {
    /// Image paths or URLs.
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<String>,

    /// Minimum number of turns per dialogue.
    #[arg(long, default_value_t = 1)]
    min_turns: u32,

    /// Maximum number of turns per dialogue.
    #[arg(long, default_value_t = 3)]
    max_turns: u32,

    /// Allow each question to be independent of the previous turn.
    #[arg(long)]
    independent: bool,

    /// Send requests one at a time instead of concurrently.
    #[arg(long)]
    sequential: bool,

    /// Provider (openai, openrouter, fireworks). Overrides QA_PROVIDER.
    #[arg(long, value_parser = parse_provider_arg)]
    provider: Option<Provider>,

    /// Model name. Overrides QA_MODEL.
    #[arg(long)]
    model: Option<String>,
}

fn parse_provider_arg(input: &str) -> std::result::Result<Provider, String> {
    input.parse().map_err(|e| format!("{}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "multiturn_qa_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = Config::from_env(args.provider)?;
    if let Some(model) = args.model {
        config.model = model;
    }

    let options = GenerationOptions::new(args.min_turns, args.max_turns).independent(args.independent);
    let mode = if args.sequential {
        BatchMode::Sequential
    } else {
        BatchMode::Concurrent
    };

    let app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    match app.run(args.images, &options, mode).await {
        Ok(report) => {
            info!(
                "Generated {}/{} dialogues, saved to {}",
                report.generated(),
                report.records.len(),
                report.output_path.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Generation failed: {}", e);
            std::process::exit(1);
        }
    }
}
