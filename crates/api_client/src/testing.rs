//! In-process [`PipelineApi`] fake for controller tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use wizard_core::wire::{
    AnalysisPoll, DeleteResponse, ExecuteResponse, StartAnalysisResponse, UploadResponse,
};
use wizard_core::{
    FileType, JobStatus, Pipeline, PipelineDraft, RawAnalysisResult, SourceConfig, TargetSelection,
    TargetSystem,
};

use crate::client::PipelineApi;
use crate::error::ApiError;
use crate::upload::SelectedFile;

#[derive(Default)]
pub(crate) struct FakeApi {
    /// Answers for status checks in order; `Processing` once exhausted
    pub status_script: Mutex<VecDeque<Result<AnalysisPoll, ApiError>>>,
    /// Error returned by every non-status call when set
    pub failure: Mutex<Option<ApiError>>,
    pub pipelines: Mutex<Vec<Pipeline>>,
    /// Non-status calls never answer
    pub stalled: bool,
    pub status_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_script(script: Vec<Result<AnalysisPoll, ApiError>>) -> Self {
        Self {
            status_script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn failing(error: ApiError) -> Self {
        Self {
            failure: Mutex::new(Some(error)),
            ..Self::default()
        }
    }

    pub fn with_pipelines(ids: &[&str]) -> Self {
        Self {
            pipelines: Mutex::new(ids.iter().map(|id| sample_pipeline(id)).collect()),
            ..Self::default()
        }
    }

    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::default()
        }
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    async fn check(&self) -> Result<(), ApiError> {
        if self.stalled {
            std::future::pending::<()>().await;
        }
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

pub(crate) fn sample_pipeline(id: &str) -> Pipeline {
    let now = Utc::now();
    Pipeline {
        id: id.to_string(),
        name: Some(format!("pipeline {}", id)),
        status: JobStatus::Pending,
        source: SourceConfig {
            file_type: Some(FileType::Csv),
            file_name: Some("orders.csv".to_string()),
            ..SourceConfig::default()
        },
        target: TargetSelection::with_defaults(TargetSystem::PostgreSql),
        transformations: Vec::new(),
        schedule: None,
        dag_code: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn sample_raw_result() -> RawAnalysisResult {
    serde_json::from_value(serde_json::json!({
        "data_analysis": { "data_type": "Transactional data" },
        "storage_recommendation": { "value": "PostgreSQL", "commentary": "ACID workload" },
        "dag_code": "from airflow import DAG",
        "user_report": "All good.",
        "confidence_score": 0.9
    }))
    .unwrap()
}

#[async_trait]
impl PipelineApi for FakeApi {
    async fn upload_file(
        &self,
        file: &SelectedFile,
        _file_type: Option<FileType>,
    ) -> Result<UploadResponse, ApiError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        Ok(UploadResponse {
            file_id: "file-1".to_string(),
            message: Some("File uploaded".to_string()),
            file_name: Some(file.name().to_string()),
            file_size: Some(file.size()),
        })
    }

    async fn start_analysis(
        &self,
        _file_id: &str,
        _file_path: &str,
    ) -> Result<StartAnalysisResponse, ApiError> {
        self.check().await?;
        Ok(StartAnalysisResponse {
            analysis_id: "analysis-1".to_string(),
            status: Some("started".to_string()),
            message: None,
        })
    }

    async fn analysis_status(&self, _analysis_id: &str) -> Result<AnalysisPoll, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(AnalysisPoll::Processing))
    }

    async fn generate_pipeline(&self, draft: &PipelineDraft) -> Result<Pipeline, ApiError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        let mut pipeline = sample_pipeline("generated");
        pipeline.transformations = draft.transformations.clone();
        self.pipelines.lock().unwrap().push(pipeline.clone());
        Ok(pipeline)
    }

    async fn get_pipeline(&self, pipeline_id: &str) -> Result<Pipeline, ApiError> {
        self.check().await?;
        self.pipelines
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == pipeline_id)
            .cloned()
            .ok_or(ApiError::Http {
                status: 404,
                body: String::new(),
            })
    }

    async fn execute_pipeline(&self, pipeline_id: &str) -> Result<ExecuteResponse, ApiError> {
        self.check().await?;
        Ok(ExecuteResponse {
            pipeline_id: pipeline_id.to_string(),
            status: JobStatus::Running,
            message: None,
        })
    }

    async fn delete_pipeline(&self, pipeline_id: &str) -> Result<DeleteResponse, ApiError> {
        self.check().await?;
        self.pipelines.lock().unwrap().retain(|p| p.id != pipeline_id);
        Ok(DeleteResponse {
            pipeline_id: pipeline_id.to_string(),
            deleted: true,
        })
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>, ApiError> {
        self.check().await?;
        Ok(self.pipelines.lock().unwrap().clone())
    }
}
