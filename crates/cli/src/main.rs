//! etl-wizard CLI
//!
//! Drives the ETL pipeline wizard without a browser: runs all six steps
//! against the API, manages stored pipelines, and serves the mock backend
//! (optionally together with the built web frontend).
//!
//! Copyright (c) 2025 Michael A Wright

mod run;

use anyhow::{bail, Context, Result};
use api_client::{ApiConfig, HttpApiClient, PipelineApi};
use clap::{Parser, Subcommand};
use etl_wizard_mock_server::{router, AppState, MockConfig, API_PREFIX};
use run::{parse_transformation, run_wizard, RunOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use wizard_core::validators::{validate_file, FileInfo, FileRules};
use wizard_core::{PollPolicy, Schedule, TargetSystem, TransformationKind};

#[derive(Parser)]
#[command(name = "etl-wizard")]
#[command(about = "Build ETL pipelines: upload -> analyze -> target -> configure -> generate -> run", long_about = None)]
struct Cli {
    /// API base URL (overrides ETL_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole wizard for one file
    Run {
        /// Data file (.csv, .json or .xml)
        #[arg(short, long)]
        file: PathBuf,

        /// Target system: postgresql, clickhouse or hdfs (default: the recommendation)
        #[arg(short, long, value_parser = parse_target)]
        target: Option<TargetSystem>,

        /// Cron expression for the schedule
        #[arg(long, conflicts_with = "interval")]
        cron: Option<String>,

        /// Schedule interval in seconds
        #[arg(long)]
        interval: Option<u64>,

        /// Transformation as kind:name, repeatable (default: deduplicate)
        #[arg(long = "transform", value_parser = parse_transformation)]
        transformations: Vec<(TransformationKind, String)>,

        /// Execute the pipeline once it is generated
        #[arg(long)]
        execute: bool,

        /// Seconds between analysis status checks
        #[arg(long, default_value = "5")]
        poll_interval: u64,

        /// Seconds before the analysis is considered timed out
        #[arg(long, default_value = "120")]
        poll_timeout: u64,
    },

    /// Manage generated pipelines
    Pipelines {
        #[command(subcommand)]
        action: PipelineAction,
    },

    /// Check a file against the upload rules without sending it
    Validate {
        /// File to check
        file: PathBuf,
    },

    /// List the supported target systems and their default settings
    Targets,

    /// Serve the mock API, and the web UI when a dist directory is given
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Status checks answered with 202 before an analysis completes
        #[arg(long, default_value = "2")]
        processing_polls: u32,

        /// Built frontend to serve at /
        #[arg(long)]
        dist: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PipelineAction {
    /// List all pipelines
    List,
    /// Show one pipeline as JSON
    Get { id: String },
    /// Start a pipeline run
    Execute { id: String },
    Delete { id: String },
}

fn parse_target(raw: &str) -> Result<TargetSystem, String> {
    TargetSystem::from_id(raw).ok_or_else(|| {
        format!(
            "unknown target '{}' (expected postgresql, clickhouse or hdfs)",
            raw
        )
    })
}

fn client(base_url: Option<String>) -> Result<Arc<dyn PipelineApi>> {
    let mut config = ApiConfig::from_env().context("invalid API configuration")?;
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url);
    }
    let client = HttpApiClient::new(config).context("failed to create API client")?;
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            target,
            cron,
            interval,
            mut transformations,
            execute,
            poll_interval,
            poll_timeout,
        } => {
            let schedule = match (cron, interval) {
                (_, Some(seconds)) => Schedule::every(seconds),
                (Some(expr), None) => Schedule::cron(expr),
                (None, None) => Schedule::cron(Schedule::DEFAULT_CRON),
            };
            if transformations.is_empty() {
                let kind = TransformationKind::Deduplicate;
                transformations.push((kind, kind.label().to_string()));
            }
            let options = RunOptions {
                file,
                target,
                schedule,
                transformations,
                execute,
                policy: PollPolicy::new(
                    Duration::from_secs(poll_interval),
                    Duration::from_secs(poll_timeout),
                ),
            };

            let wizard = run_wizard(client(cli.base_url)?, options).await?;
            if let Some(pipeline) = &wizard.data().pipeline {
                println!("{}", serde_json::to_string_pretty(pipeline)?);
            }
            Ok(())
        }
        Commands::Pipelines { action } => {
            let api = client(cli.base_url)?;
            match action {
                PipelineAction::List => {
                    let pipelines = api.list_pipelines().await?;
                    if pipelines.is_empty() {
                        println!("No pipelines");
                    }
                    for p in pipelines {
                        println!(
                            "{}  {:<10} {}",
                            p.id,
                            format!("{:?}", p.status).to_lowercase(),
                            p.name.unwrap_or_default()
                        );
                    }
                }
                PipelineAction::Get { id } => {
                    let pipeline = api.get_pipeline(&id).await?;
                    println!("{}", serde_json::to_string_pretty(&pipeline)?);
                }
                PipelineAction::Execute { id } => {
                    let response = api.execute_pipeline(&id).await?;
                    println!("{}: {:?}", response.pipeline_id, response.status);
                }
                PipelineAction::Delete { id } => {
                    api.delete_pipeline(&id).await?;
                    println!("Deleted {}", id);
                }
            }
            Ok(())
        }
        Commands::Validate { file } => {
            let metadata = std::fs::metadata(&file)
                .with_context(|| format!("failed to stat {}", file.display()))?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let result = validate_file(
                Some(&FileInfo::new(name, metadata.len())),
                &FileRules::default(),
            );
            if !result.is_valid {
                bail!("{}: {}", file.display(), result.message());
            }
            println!("{}: ok", file.display());
            Ok(())
        }
        Commands::Targets => {
            for system in TargetSystem::ALL {
                let info = system.info();
                println!("{:<11} {} - {}", system.id(), info.name, info.description);
                println!("            features: {}", info.features.join(", "));
                println!(
                    "            defaults: {}",
                    serde_json::to_string(&system.default_config())?
                );
            }
            Ok(())
        }
        Commands::Serve {
            port,
            processing_polls,
            dist,
        } => {
            let mut app = router(AppState::new(MockConfig { processing_polls }));
            if let Some(dist) = dist {
                app = app.fallback_service(ServeDir::new(dist));
            }
            let app = app
                .layer(CorsLayer::permissive())
                .layer(TraceLayer::new_for_http());

            let addr = format!("127.0.0.1:{}", port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {}", addr))?;
            tracing::info!("Serving on http://{} (API at {})", addr, API_PREFIX);
            axum::serve(listener, app).await?;
            Ok(())
        }
    }
}
