//! HTTP client for the pipeline API

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use wizard_core::wire::{
    self, AnalysisPoll, AnalysisStatusResponse, DeleteResponse, ExecuteResponse, PipelineList,
    StartAnalysisRequest, StartAnalysisResponse, UploadResponse,
};
use wizard_core::{FileType, Pipeline, PipelineDraft};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::upload::SelectedFile;

/// Domain operations offered by the backend
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Store a file; `file_type` of `None` lets the server detect it
    async fn upload_file(
        &self,
        file: &SelectedFile,
        file_type: Option<FileType>,
    ) -> Result<UploadResponse, ApiError>;

    async fn start_analysis(
        &self,
        file_id: &str,
        file_path: &str,
    ) -> Result<StartAnalysisResponse, ApiError>;

    /// One status check; "still processing" is `Ok(AnalysisPoll::Processing)`
    async fn analysis_status(&self, analysis_id: &str) -> Result<AnalysisPoll, ApiError>;

    async fn generate_pipeline(&self, draft: &PipelineDraft) -> Result<Pipeline, ApiError>;

    async fn get_pipeline(&self, pipeline_id: &str) -> Result<Pipeline, ApiError>;

    async fn execute_pipeline(&self, pipeline_id: &str) -> Result<ExecuteResponse, ApiError>;

    async fn delete_pipeline(&self, pipeline_id: &str) -> Result<DeleteResponse, ApiError>;

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>, ApiError>;
}

/// [`PipelineApi`] over HTTP
pub struct HttpApiClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a client from `ETL_API_*` environment variables
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ApiConfig::from_env()?)
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(ApiError::transport)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(ApiError::transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PipelineApi for HttpApiClient {
    async fn upload_file(
        &self,
        file: &SelectedFile,
        file_type: Option<FileType>,
    ) -> Result<UploadResponse, ApiError> {
        let url = self.config.url(wire::UPLOAD_PATH);
        debug!(%url, file = %file.name(), size = file.size(), "uploading file");

        let part = Part::bytes(file.bytes.clone()).file_name(file.name().to_string());
        let form = Form::new()
            .part("file", part)
            .text("file_type", file_type.map(|t| t.as_str()).unwrap_or_default())
            .text("user_id", self.config.user_id.clone())
            .text("target_db", self.config.target_db.clone());

        self.send_json(self.client.post(&url).multipart(form)).await
    }

    async fn start_analysis(
        &self,
        file_id: &str,
        file_path: &str,
    ) -> Result<StartAnalysisResponse, ApiError> {
        let url = self.config.url(wire::ANALYSIS_START_PATH);
        let body = StartAnalysisRequest {
            file_id: file_id.to_string(),
            user_id: self.config.user_id.clone(),
            file_path: file_path.to_string(),
        };
        debug!(%url, file_id, "starting analysis");

        self.send_json(self.client.post(&url).json(&body)).await
    }

    async fn analysis_status(&self, analysis_id: &str) -> Result<AnalysisPoll, ApiError> {
        let url = self.config.url(&wire::analysis_status_path(analysis_id));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::transport)?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            debug!(analysis_id, "analysis still processing");
            return Ok(AnalysisPoll::Processing);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(ApiError::transport)?;
        let parsed: AnalysisStatusResponse =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(parsed.into_poll())
    }

    async fn generate_pipeline(&self, draft: &PipelineDraft) -> Result<Pipeline, ApiError> {
        let url = self.config.url(wire::GENERATE_PIPELINE_PATH);
        self.send_json(self.client.post(&url).json(draft)).await
    }

    async fn get_pipeline(&self, pipeline_id: &str) -> Result<Pipeline, ApiError> {
        let url = self.config.url(&wire::pipeline_path(pipeline_id));
        self.send_json(self.client.get(&url)).await
    }

    async fn execute_pipeline(&self, pipeline_id: &str) -> Result<ExecuteResponse, ApiError> {
        let url = self.config.url(&wire::pipeline_execute_path(pipeline_id));
        self.send_json(self.client.post(&url)).await
    }

    async fn delete_pipeline(&self, pipeline_id: &str) -> Result<DeleteResponse, ApiError> {
        let url = self.config.url(&wire::pipeline_path(pipeline_id));
        self.send_json(self.client.delete(&url)).await
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>, ApiError> {
        let url = self.config.url(wire::PIPELINES_PATH);
        let list: PipelineList = self.send_json(self.client.get(&url)).await?;
        Ok(list.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpApiClient::new(ApiConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        let config = ApiConfig::default().with_base_url("::nope");
        assert!(matches!(HttpApiClient::new(config), Err(ApiError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // port 9 (discard) is closed on test machines
        let config = ApiConfig {
            timeout_secs: 2,
            ..ApiConfig::default().with_base_url("http://127.0.0.1:9/api/v1")
        };
        let client = HttpApiClient::new(config).unwrap();

        let result = client.list_pipelines().await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
