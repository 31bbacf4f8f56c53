//! Client and controllers against the in-memory backend on a real socket

use api_client::{
    AnalysisController, AnalysisPhase, ApiConfig, ApiError, FileUploadController, HttpApiClient,
    PipelineApi, PipelineController, SelectedFile,
};
use etl_wizard_mock_server::{router, AppState, MockConfig, API_PREFIX};
use std::sync::Arc;
use std::time::Duration;
use wizard_core::{
    EtlConfig, JobStatus, PipelineDraft, PollPolicy, Schedule, SourceConfig, TargetSelection,
    TargetSystem, TransformationKind, WizardMachine, WizardUpdate,
};

async fn spawn_backend(processing_polls: u32) -> Arc<HttpApiClient> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(MockConfig { processing_polls }));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ApiConfig::default().with_base_url(format!("http://{}{}", addr, API_PREFIX));
    Arc::new(HttpApiClient::new(config).unwrap())
}

fn fast_policy() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(20), Duration::from_secs(5))
}

#[tokio::test]
async fn test_full_wizard_flow() {
    let client = spawn_backend(2).await;
    let mut wizard = WizardMachine::new();

    let mut upload = FileUploadController::new(client.clone());
    upload.select_file(Some(SelectedFile::new(
        "orders.csv",
        b"id,amount\n1,10\n2,20\n".to_vec(),
    )));
    let uploaded = upload.upload().await.expect("upload succeeds");
    assert!(uploaded.storage_path.ends_with("/orders.csv"));

    wizard.update_wizard_data(WizardUpdate::source(SourceConfig {
        file_name: Some("orders.csv".to_string()),
        file_id: Some(uploaded.file_id.clone()),
        storage_path: Some(uploaded.storage_path.clone()),
        ..SourceConfig::default()
    }));
    assert!(wizard.next_step());

    let mut analysis = AnalysisController::with_policy(client.clone(), fast_policy());
    analysis
        .start_analysis(&uploaded.file_id, &uploaded.storage_path)
        .await
        .expect("analysis starts");
    let state = analysis.wait().await;
    assert_eq!(state.phase, AnalysisPhase::Completed, "{:?}", state.error);
    assert_eq!(state.polls, 3);
    let results = state.result.unwrap();
    assert_eq!(results.recommended_storage(), "PostgreSQL");

    wizard.update_wizard_data(WizardUpdate::analysis(results));
    assert!(wizard.next_step());
    wizard.update_wizard_data(WizardUpdate::target(TargetSelection::with_defaults(
        TargetSystem::PostgreSql,
    )));
    assert!(wizard.next_step());

    let mut etl = EtlConfig {
        schedule: Some(Schedule::cron(Schedule::DEFAULT_CRON)),
        ..EtlConfig::default()
    };
    etl.add_transformation(TransformationKind::Filter, "drop empty rows");
    wizard.update_wizard_data(WizardUpdate::etl_config(etl));
    assert!(wizard.next_step());

    let mut pipelines = PipelineController::new(client.clone());
    let draft = PipelineDraft::from_wizard(wizard.data());
    let pipeline = pipelines.generate_pipeline(&draft).await.expect("pipeline generated");
    assert_eq!(pipeline.status, JobStatus::Pending);
    assert!(pipeline.dag_code.as_deref().unwrap().contains("airflow"));

    let executed = pipelines.execute_pipeline(&pipeline.id).await.unwrap();
    assert_eq!(executed.status, JobStatus::Completed);

    let listed = pipelines.list_pipelines().await.unwrap();
    assert_eq!(listed.len(), 1);

    pipelines.delete_pipeline(&pipeline.id).await.unwrap();
    assert!(pipelines.pipelines().is_empty());
    assert!(client.list_pipelines().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_pipeline_is_http_error() {
    let client = spawn_backend(0).await;

    let result = client.get_pipeline("does-not-exist").await;
    assert!(matches!(result, Err(ApiError::Http { status: 404, .. })));

    let mut pipelines = PipelineController::new(client);
    assert!(pipelines.get_pipeline("does-not-exist").await.is_none());
    assert_eq!(pipelines.error(), Some("Server error: 404"));
}

#[tokio::test]
async fn test_failed_job_surfaces_server_error() {
    let client = spawn_backend(1).await;

    let mut upload = FileUploadController::new(client.clone());
    upload.select_file(Some(SelectedFile::new("empty.json", Vec::new())));
    let uploaded = upload.upload().await.unwrap();

    let mut analysis = AnalysisController::with_policy(client, fast_policy());
    analysis
        .start_analysis(&uploaded.file_id, &uploaded.storage_path)
        .await
        .unwrap();
    let state = analysis.wait().await;

    assert_eq!(state.phase, AnalysisPhase::Failed);
    assert_eq!(state.error.as_deref(), Some("Uploaded file is empty"));
}
