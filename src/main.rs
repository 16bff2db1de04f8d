use anyhow::{Context, Result};
use clap::Parser;
use gemini_relay::ai::GeminiClient;
use gemini_relay::models::{Config, API_KEY_VAR};
use gemini_relay::relay::Relay;
use gemini_relay::server::{build_router, API_PATH, FUNCTION_PATH};
use std::net::SocketAddr;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-relay")]
#[command(about = "Relay structured generation requests to Gemini")]
struct CliArgs {
    /// Address to listen on. Overrides RELAY_BIND_ADDR.
    #[arg(long, value_name = "ADDR", value_parser = parse_bind_arg)]
    bind: Option<SocketAddr>,

    /// Gemini model id. Overrides GEMINI_MODEL.
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,
}

fn parse_bind_arg(input: &str) -> std::result::Result<SocketAddr, String> {
    input
        .parse()
        .map_err(|_| format!("Invalid address '{}'. Expected format: HOST:PORT", input))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gemini-relay");

    let args = CliArgs::parse();

    if let Err(e) = run(args).await {
        error!("Relay failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(args: CliArgs) -> Result<()> {
    let config = Config::from_env()?;

    let addr = match args.bind {
        Some(addr) => addr,
        None => parse_bind_arg(&config.bind_addr).map_err(anyhow::Error::msg)?,
    };
    let model = args.model.unwrap_or(config.gemini_model);

    if config.gemini_api_key.is_none() {
        warn!(
            "{} is not set; every relay call will fail with a configuration error",
            API_KEY_VAR
        );
    }

    let client = GeminiClient::new(model).with_base_url(config.gemini_base_url);
    info!("Gemini model: {}", client.model());

    let app = build_router(Relay::new(Box::new(client), config.gemini_api_key));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        "Relay listening on {} ({}, {})",
        listener.local_addr().unwrap_or(addr),
        FUNCTION_PATH,
        API_PATH
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
