//! etl-wizard mock backend

use anyhow::{Context, Result};
use clap::Parser;
use etl_wizard_mock_server::{router, AppState, MockConfig, API_PREFIX};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "etl-wizard-mock")]
#[command(about = "In-memory backend for the ETL pipeline wizard", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Status checks answered with 202 before an analysis completes
    #[arg(long, default_value = "2")]
    processing_polls: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let state = AppState::new(MockConfig {
        processing_polls: args.processing_polls,
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Mock API listening on http://{}{}", addr, API_PREFIX);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
