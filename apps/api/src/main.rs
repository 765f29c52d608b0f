use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crewboard::api;
use crewboard::cli::{self, Cli, Commands};
use crewboard::config::Config;
use crewboard::coordination::Coordinator;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Load environment variables before clap reads them
    let mut config = Config::from_env()?;
    let cli = Cli::parse();

    // Keep one-shot output quiet unless RUST_LOG asks for more
    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    init_tracing(default_level);

    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    let coordinator = Coordinator::open(&config.data_dir)
        .await
        .with_context(|| format!("Failed to open board at {}", config.data_dir.display()))?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(Arc::new(coordinator), &config).await?;
            Ok(ExitCode::SUCCESS)
        }
        command => cli::execute(command, &coordinator).await,
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(coordinator: Arc<Coordinator>, config: &Config) -> Result<()> {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = api::router(coordinator)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(data_dir = %config.data_dir.display(), "Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
