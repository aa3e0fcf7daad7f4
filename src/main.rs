use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcp_tool_harness::{
    config::{Config, LogFormat},
    fixtures::{FixtureRegistry, TestCase},
    llm::AnthropicClient,
    mcp::SessionClient,
    orchestrator::Orchestrator,
};

/// Evaluate a language model against an MCP tool server.
#[derive(Parser, Debug)]
#[command(name = "mcp-tool-harness", version, about)]
struct Cli {
    /// JSON fixture file with additional test cases
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Only run cases of this category
    #[arg(long)]
    category: Option<String>,

    /// Only run the case with this id
    #[arg(long)]
    test: Option<String>,

    /// List the selected cases and exit
    #[arg(long)]
    list: bool,

    /// Override MAX_TOOL_ROUNDS
    #[arg(long)]
    max_tool_rounds: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut registry = FixtureRegistry::new();
    if let Some(path) = &cli.fixtures {
        registry.load_json_file(path)?;
    }
    let cases = select_cases(&registry, &cli)?;

    if cli.list {
        println!("{}", serde_json::to_string_pretty(&cases)?);
        return Ok(());
    }

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(rounds) = cli.max_tool_rounds {
        config.evaluation.max_tool_rounds = rounds;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        cases = cases.len(),
        "MCP tool harness starting..."
    );

    let provider = match AnthropicClient::new(&config.provider, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %c.base_url(), model = %c.model(), "Provider client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize provider client");
            return Err(e.into());
        }
    };

    let mut session = SessionClient::new(config.session.clone());
    if let Err(e) = session.connect().await {
        error!(error = %e, "Failed to connect to tool server");
        session.disconnect().await;
        return Err(e.into());
    }

    let mut orchestrator =
        Orchestrator::initialize(session, Arc::new(provider), config.evaluation.clone())?;

    let report = orchestrator.run_suite(&cases).await;

    let mut session = orchestrator.into_session();
    session.disconnect().await;

    if report.summary.failed > 0 {
        warn!(
            failed = report.summary.failed,
            total = report.summary.total,
            "Some test cases failed"
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!("Harness run complete");
    Ok(())
}

fn select_cases(registry: &FixtureRegistry, cli: &Cli) -> anyhow::Result<Vec<TestCase>> {
    if let Some(id) = &cli.test {
        return registry
            .get(id)
            .cloned()
            .map(|case| vec![case])
            .ok_or_else(|| anyhow::anyhow!("Unknown test case: {}", id));
    }

    let cases = registry.list(cli.category.as_deref());
    if cases.is_empty() {
        anyhow::bail!(
            "No test cases selected (categories: {})",
            registry.categories().join(", ")
        );
    }
    Ok(cases)
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
