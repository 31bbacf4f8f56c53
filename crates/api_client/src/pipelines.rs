//! Pipeline collection controller

use std::sync::Arc;
use tracing::info;
use wizard_core::validators::validate_pipeline_data;
use wizard_core::wire::{DeleteResponse, ExecuteResponse};
use wizard_core::{AppError, Pipeline, PipelineDraft};

use crate::client::PipelineApi;
use crate::state::OperationState;

/// Generates, fetches, executes and deletes pipelines, keeping a local cache
pub struct PipelineController {
    api: Arc<dyn PipelineApi>,
    pipelines: Vec<Pipeline>,
    current: Option<Pipeline>,
    state: OperationState,
}

impl PipelineController {
    pub fn new(api: Arc<dyn PipelineApi>) -> Self {
        Self {
            api,
            pipelines: Vec::new(),
            current: None,
            state: OperationState::default(),
        }
    }

    /// Validate the draft and ask the server to generate a pipeline from it
    pub async fn generate_pipeline(&mut self, draft: &PipelineDraft) -> Option<Pipeline> {
        let attempt = self.state.begin();

        let validation = validate_pipeline_data(draft);
        if !validation.is_valid {
            attempt.reject(AppError::invalid(&validation.errors));
            return None;
        }

        let pipeline = attempt.settle(self.api.generate_pipeline(draft).await)?;
        info!(pipeline_id = %pipeline.id, "pipeline generated");
        self.current = Some(pipeline.clone());
        Some(pipeline)
    }

    pub async fn get_pipeline(&mut self, pipeline_id: &str) -> Option<Pipeline> {
        let attempt = self.state.begin();
        let pipeline = attempt.settle(self.api.get_pipeline(pipeline_id).await)?;
        self.current = Some(pipeline.clone());
        Some(pipeline)
    }

    /// Start a run. The new status is applied to cached copies that still
    /// exist; a delete that won the race leaves nothing to update.
    pub async fn execute_pipeline(&mut self, pipeline_id: &str) -> Option<ExecuteResponse> {
        let attempt = self.state.begin();
        let response = attempt.settle(self.api.execute_pipeline(pipeline_id).await)?;
        info!(pipeline_id, status = ?response.status, "pipeline execution started");

        if let Some(current) = self.current.as_mut().filter(|p| p.id == pipeline_id) {
            current.status = response.status;
        }
        if let Some(cached) = self.pipelines.iter_mut().find(|p| p.id == pipeline_id) {
            cached.status = response.status;
        }
        Some(response)
    }

    /// Delete on the server, then drop the id from the cache without a refetch
    pub async fn delete_pipeline(&mut self, pipeline_id: &str) -> Option<DeleteResponse> {
        let attempt = self.state.begin();
        let response = attempt.settle(self.api.delete_pipeline(pipeline_id).await)?;
        info!(pipeline_id, "pipeline deleted");

        self.pipelines.retain(|p| p.id != pipeline_id);
        if self.current.as_ref().is_some_and(|p| p.id == pipeline_id) {
            self.current = None;
        }
        Some(response)
    }

    pub async fn list_pipelines(&mut self) -> Option<Vec<Pipeline>> {
        let attempt = self.state.begin();
        let pipelines = attempt.settle(self.api.list_pipelines().await)?;
        self.pipelines = pipelines.clone();
        Some(pipelines)
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.state.reset();
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn current_pipeline(&self) -> Option<&Pipeline> {
        self.current.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::testing::FakeApi;
    use std::sync::atomic::Ordering;
    use wizard_core::{
        JobStatus, SourceConfig, TargetSelection, TargetSystem, Transformation, TransformationKind,
    };

    fn complete_draft() -> PipelineDraft {
        PipelineDraft {
            source: Some(SourceConfig::default()),
            target: Some(TargetSelection::with_defaults(TargetSystem::ClickHouse)),
            transformations: vec![Transformation::new(1, TransformationKind::Filter, "drop nulls")],
            ..PipelineDraft::default()
        }
    }

    #[tokio::test]
    async fn test_delete_then_list_consistency() {
        let fake = Arc::new(FakeApi::with_pipelines(&["p1", "p2", "p3"]));
        let mut controller = PipelineController::new(fake);

        controller.list_pipelines().await.unwrap();
        controller.get_pipeline("p2").await.unwrap();
        assert_eq!(controller.pipelines().len(), 3);

        let deleted = controller.delete_pipeline("p2").await.unwrap();
        assert!(deleted.deleted);
        assert!(controller.pipelines().iter().all(|p| p.id != "p2"));
        assert_eq!(controller.pipelines().len(), 2);
        assert!(controller.current_pipeline().is_none());
    }

    #[tokio::test]
    async fn test_execute_after_delete_does_not_restore_pipeline() {
        let fake = Arc::new(FakeApi::with_pipelines(&["p1", "p2"]));
        let mut controller = PipelineController::new(fake);

        controller.list_pipelines().await.unwrap();
        controller.get_pipeline("p1").await.unwrap();
        controller.delete_pipeline("p1").await.unwrap();

        let executed = controller.execute_pipeline("p1").await.unwrap();
        assert_eq!(executed.status, JobStatus::Running);
        assert!(controller.pipelines().iter().all(|p| p.id != "p1"));
        assert_eq!(controller.pipelines().len(), 1);
        assert!(controller.current_pipeline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_request_clears_loading() {
        let mut controller = PipelineController::new(Arc::new(FakeApi::stalled()));

        let attempt = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            controller.list_pipelines(),
        )
        .await;
        assert!(attempt.is_err());
        assert!(!controller.loading());
        assert_eq!(controller.error(), None);
    }

    #[tokio::test]
    async fn test_delete_keeps_unrelated_current() {
        let fake = Arc::new(FakeApi::with_pipelines(&["p1", "p2"]));
        let mut controller = PipelineController::new(fake);

        controller.get_pipeline("p1").await.unwrap();
        controller.delete_pipeline("p2").await.unwrap();
        assert_eq!(controller.current_pipeline().map(|p| p.id.as_str()), Some("p1"));
    }

    #[tokio::test]
    async fn test_generate_validates_before_network() {
        let fake = Arc::new(FakeApi::default());
        let mut controller = PipelineController::new(fake.clone());

        assert!(controller
            .generate_pipeline(&PipelineDraft::default())
            .await
            .is_none());
        assert_eq!(
            controller.error(),
            Some("No data source specified, No target system specified, No data transformations specified")
        );
        assert_eq!(fake.generate_calls.load(Ordering::SeqCst), 0);
        assert!(!controller.loading());
    }

    #[tokio::test]
    async fn test_generate_sets_current() {
        let fake = Arc::new(FakeApi::default());
        let mut controller = PipelineController::new(fake.clone());

        let pipeline = controller.generate_pipeline(&complete_draft()).await.unwrap();
        assert_eq!(pipeline.transformations.len(), 1);
        assert_eq!(controller.current_pipeline(), Some(&pipeline));
        assert_eq!(fake.generate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_updates_cached_status() {
        let fake = Arc::new(FakeApi::with_pipelines(&["p1"]));
        let mut controller = PipelineController::new(fake);

        controller.list_pipelines().await.unwrap();
        controller.get_pipeline("p1").await.unwrap();
        controller.execute_pipeline("p1").await.unwrap();

        assert_eq!(controller.current_pipeline().unwrap().status, JobStatus::Running);
        assert_eq!(controller.pipelines()[0].status, JobStatus::Running);
    }

    #[tokio::test]
    async fn test_http_failure_returns_none_and_keeps_cache() {
        let fake = Arc::new(FakeApi::with_pipelines(&["p1"]));
        let mut controller = PipelineController::new(fake.clone());
        controller.list_pipelines().await.unwrap();

        *fake.failure.lock().unwrap() = Some(ApiError::Http {
            status: 404,
            body: String::new(),
        });
        assert!(controller.delete_pipeline("p1").await.is_none());
        assert_eq!(controller.error(), Some("Server error: 404"));
        assert_eq!(controller.pipelines().len(), 1);
        assert!(!controller.loading());
    }

    #[tokio::test]
    async fn test_reset_clears_current_and_error() {
        let fake = Arc::new(FakeApi::with_pipelines(&["p1"]));
        let mut controller = PipelineController::new(fake);
        controller.get_pipeline("p1").await.unwrap();
        controller.get_pipeline("missing").await;
        assert!(controller.error().is_some());

        controller.reset();
        assert!(controller.current_pipeline().is_none());
        assert_eq!(controller.error(), None);
    }
}
