//! Headless wizard: walks all six steps against the API

use anyhow::{anyhow, bail, Context, Result};
use api_client::{
    AnalysisController, AnalysisPhase, FileUploadController, PipelineApi, PipelineController,
    SelectedFile,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use wizard_core::types::{ExecutionStatus, LogLevel};
use wizard_core::validators::validate_etl_config;
use wizard_core::{
    EtlConfig, MonitoringState, PipelineDraft, PollPolicy, Schedule, SourceConfig, SourceKind,
    TargetSelection, TargetSystem, TransformationKind, WizardMachine, WizardUpdate,
};

/// Choices the interactive wizard would ask for
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub file: PathBuf,
    /// `None` follows the analysis recommendation
    pub target: Option<TargetSystem>,
    pub schedule: Schedule,
    pub transformations: Vec<(TransformationKind, String)>,
    pub execute: bool,
    pub policy: PollPolicy,
}

/// `kind:name`, e.g. `filter:drop empty rows`
pub fn parse_transformation(raw: &str) -> Result<(TransformationKind, String), String> {
    let (kind, name) = raw.split_once(':').unwrap_or((raw, ""));
    let kind = TransformationKind::from_id(kind).ok_or_else(|| {
        format!(
            "unknown transformation '{}' (expected filter, map, aggregate, join or deduplicate)",
            kind.trim()
        )
    })?;
    let name = match name.trim() {
        "" => kind.label().to_string(),
        name => name.to_string(),
    };
    Ok((kind, name))
}

fn advance(wizard: &mut WizardMachine) -> Result<()> {
    if wizard.next_step() {
        info!(step = %wizard.current_step(), "step completed");
        return Ok(());
    }
    let message = wizard
        .errors()
        .values()
        .next()
        .cloned()
        .unwrap_or_else(|| "step requirements not met".to_string());
    bail!("cannot leave step {}: {}", wizard.current_step(), message)
}

pub async fn run_wizard(api: Arc<dyn PipelineApi>, options: RunOptions) -> Result<WizardMachine> {
    let mut wizard = WizardMachine::new();

    // Data source
    let file = SelectedFile::read(&options.file)
        .await
        .with_context(|| format!("failed to read {}", options.file.display()))?;
    let file_name = file.name().to_string();
    let file_size = file.size();

    let mut upload = FileUploadController::new(Arc::clone(&api));
    upload.select_file(Some(file));
    let uploaded = upload
        .upload()
        .await
        .ok_or_else(|| anyhow!("upload failed: {}", upload.error().unwrap_or("unknown error")))?;
    println!("Uploaded {} ({} bytes) as {}", file_name, file_size, uploaded.file_id);

    wizard.update_wizard_data(WizardUpdate::source(SourceConfig {
        kind: SourceKind::File,
        file_type: wizard_core::validators::file_type_for(&file_name),
        file_name: Some(file_name),
        file_size: Some(file_size),
        file_id: Some(uploaded.file_id.clone()),
        storage_path: Some(uploaded.storage_path.clone()),
    }));
    advance(&mut wizard)?;

    // Analysis
    let mut analysis = AnalysisController::with_policy(Arc::clone(&api), options.policy);
    analysis
        .start_analysis(&uploaded.file_id, &uploaded.storage_path)
        .await;

    let mut updates = analysis.subscribe();
    let reporter = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if let Some(message) = state.status_message {
                info!(progress = state.progress, "{}", message);
            }
        }
    });
    let state = analysis.wait().await;
    reporter.abort();

    let results = match (state.phase, state.result) {
        (AnalysisPhase::Completed, Some(results)) => results,
        _ => bail!(
            "analysis failed: {}",
            state.error.unwrap_or_else(|| "no result".to_string())
        ),
    };
    println!(
        "Analysis complete after {} status checks; recommended storage: {}",
        state.polls,
        results.recommended_storage()
    );
    let recommended = TargetSystem::from_id(results.recommended_storage());
    wizard.update_wizard_data(WizardUpdate::analysis(results));
    advance(&mut wizard)?;

    // Target
    let system = options
        .target
        .or(recommended)
        .unwrap_or(TargetSystem::PostgreSql);
    println!("Target system: {}", system);
    wizard.update_wizard_data(WizardUpdate::target(TargetSelection::with_defaults(system)));
    advance(&mut wizard)?;

    // ETL config
    let mut etl = EtlConfig {
        schedule: Some(options.schedule.clone()),
        ..EtlConfig::default()
    };
    for (kind, name) in &options.transformations {
        etl.add_transformation(*kind, name.clone());
    }
    let validation = validate_etl_config(&etl);
    if !validation.is_valid {
        bail!("invalid ETL configuration: {}", validation.message());
    }
    wizard.update_wizard_data(WizardUpdate::etl_config(etl));
    advance(&mut wizard)?;

    // Pipeline
    let mut pipelines = PipelineController::new(Arc::clone(&api));
    let draft = PipelineDraft::from_wizard(wizard.data());
    let pipeline = pipelines.generate_pipeline(&draft).await.ok_or_else(|| {
        anyhow!(
            "pipeline generation failed: {}",
            pipelines.error().unwrap_or("unknown error")
        )
    })?;
    println!("Generated pipeline {}", pipeline.id);
    let pipeline_id = pipeline.id.clone();
    wizard.update_wizard_data(WizardUpdate::pipeline(pipeline));
    advance(&mut wizard)?;

    // Monitoring
    let mut monitoring = MonitoringState::default();
    if options.execute {
        monitoring.record(ExecutionStatus::Running, LogLevel::Info, "Starting pipeline...");
        match pipelines.execute_pipeline(&pipeline_id).await {
            Some(response) => {
                monitoring.record(
                    ExecutionStatus::Completed,
                    LogLevel::Success,
                    response
                        .message
                        .unwrap_or_else(|| "Pipeline executed".to_string()),
                );
                println!("Pipeline {} executed ({:?})", pipeline_id, response.status);
            }
            None => {
                bail!(
                    "pipeline execution failed: {}",
                    pipelines.error().unwrap_or("unknown error")
                );
            }
        }
    }
    wizard.update_wizard_data(WizardUpdate::monitoring(monitoring));
    wizard
        .complete_wizard()
        .context("wizard did not reach the last step")?;

    Ok(wizard)
}
