//! SVG Animator
//!
//! Serves a browser form that sends static SVG and an animation description
//! to Azure OpenAI and returns validated, SMIL-animated SVG.

use anyhow::{Context, Result};
use std::sync::Arc;
use svg_animator::api::endpoints::{AppState, create_router};
use svg_animator::core::animator::Animator;
use svg_animator::core::config::Config;
use svg_animator::core::logging::init_logging;
use svg_animator::core::prompt::SamplingParams;
use svg_animator::core::provider::Provider;
use svg_animator::core::providers::AzureOpenAIProvider;
use svg_animator::markup::SubstitutionTable;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Check for --help flag
    if std::env::args().any(|arg| arg == "--help") {
        print_help();
        return;
    }

    // A missing .env file is fine; the variables may come from the environment
    dotenv::dotenv().ok();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config.log_level);

    // Print startup banner
    print_startup_banner(&config);

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Arc<Config>) -> Result<()> {
    let substitutions = match &config.substitutions_path {
        Some(path) => SubstitutionTable::load(path)?,
        None => SubstitutionTable::builtin(),
    };
    info!(
        "Substitution rules: {}",
        substitutions.names().collect::<Vec<_>>().join(", ")
    );

    let provider: Arc<dyn Provider> = Arc::new(
        AzureOpenAIProvider::from_config(&config).context("Failed to create HTTP client")?,
    );
    info!("Using provider: {}", provider.provider_name());

    let animator = Animator::new(
        provider,
        Arc::new(substitutions),
        SamplingParams {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        },
    );

    // Create router
    let app = create_router(AppState {
        config: config.clone(),
        animator: Arc::new(animator),
    });

    // Bind to address
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Print startup banner with configuration
fn print_startup_banner(config: &Config) {
    println!("🤖 SVG Animator v{}", env!("CARGO_PKG_VERSION"));
    println!("✅ Configuration loaded successfully");
    println!("   Endpoint: {}", config.endpoint);
    println!("   Deployment: {}", config.deployment);
    println!("   API Version: {}", config.api_version);
    println!("   Temperature: {}", config.temperature);
    println!("   Max Tokens: {}", config.max_tokens);
    println!("   Request Timeout: {}s", config.request_timeout.as_secs());
    if let Some(path) = &config.substitutions_path {
        println!("   Extra Substitution Rules: {}", path.display());
    }
    println!("   Server: http://{}:{}", config.host, config.port);
    println!();
}

/// Print help message
fn print_help() {
    println!("SVG Animator v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: svg-animator [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --help    Display this help message");
    println!();
    println!("Environment variables (a .env file in the working directory is loaded first):");
    println!("  AZURE_OPENAI_ENDPOINT - Azure OpenAI resource URL (required)");
    println!("  AZURE_OPENAI_API_KEY - Azure OpenAI API key (required)");
    println!("  AZURE_OPENAI_DEPLOYMENT_NAME - Deployment name (required)");
    println!("  AZURE_OPENAI_API_VERSION - REST API version (default: 2024-02-01)");
    println!("  HOST - Server host (default: 127.0.0.1)");
    println!("  PORT - Server port (default: 8501)");
    println!("  LOG_LEVEL - Logging level (default: info)");
    println!("  REQUEST_TIMEOUT - Request timeout in seconds (default: 120)");
    println!("  TEMPERATURE - Sampling temperature (default: 0.6)");
    println!("  MAX_TOKENS - Completion token limit (default: 4000)");
    println!("  SUBSTITUTIONS_PATH - TOML file with extra cleanup rules");
}
