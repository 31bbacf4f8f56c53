//! Browser-side calls to the pipeline API over `fetch`

use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use web_sys::{File, FormData};
use wizard_core::validators::file_type_for;
use wizard_core::wire::{
    self, AnalysisPoll, AnalysisStatusResponse, DeleteResponse, ExecuteResponse, PipelineList,
    StartAnalysisRequest, StartAnalysisResponse, UploadResponse,
};
use wizard_core::{AppError, Pipeline, PipelineDraft};

/// Same-origin by default; override at build time with `ETL_API_BASE_URL`
pub const DEFAULT_BASE_URL: &str = "/api/v1";
const DEFAULT_USER_ID: &str = "default_user";
const DEFAULT_TARGET_DB: &str = "postgres";

#[derive(Debug, Clone, PartialEq)]
pub struct BrowserApi {
    base_url: String,
    user_id: String,
}

impl Default for BrowserApi {
    fn default() -> Self {
        Self {
            base_url: option_env!("ETL_API_BASE_URL")
                .unwrap_or(DEFAULT_BASE_URL)
                .to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

impl BrowserApi {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn upload_file(&self, file: &File) -> Result<UploadResponse, AppError> {
        let form = FormData::new().map_err(|_| AppError::unknown("FormData is not available"))?;
        let file_type = file_type_for(&file.name())
            .map(|t| t.as_str())
            .unwrap_or_default();
        form.append_with_blob_and_filename("file", file, &file.name())
            .and_then(|_| form.append_with_str("file_type", file_type))
            .and_then(|_| form.append_with_str("user_id", &self.user_id))
            .and_then(|_| form.append_with_str("target_db", DEFAULT_TARGET_DB))
            .map_err(|_| AppError::unknown("Could not build the upload form"))?;

        let request = Request::post(&self.url(wire::UPLOAD_PATH))
            .body(form)
            .map_err(|e| AppError::unknown(e.to_string()))?;
        read_json(request.send().await.map_err(network)?).await
    }

    pub async fn start_analysis(
        &self,
        file_id: &str,
        file_path: &str,
    ) -> Result<StartAnalysisResponse, AppError> {
        let body = StartAnalysisRequest {
            file_id: file_id.to_string(),
            user_id: self.user_id.clone(),
            file_path: file_path.to_string(),
        };
        let request = Request::post(&self.url(wire::ANALYSIS_START_PATH))
            .json(&body)
            .map_err(|e| AppError::unknown(e.to_string()))?;
        read_json(request.send().await.map_err(network)?).await
    }

    pub async fn analysis_status(&self, analysis_id: &str) -> Result<AnalysisPoll, AppError> {
        let response = Request::get(&self.url(&wire::analysis_status_path(analysis_id)))
            .send()
            .await
            .map_err(network)?;
        if response.status() == 202 {
            return Ok(AnalysisPoll::Processing);
        }
        let body: AnalysisStatusResponse = read_json(response).await?;
        Ok(body.into_poll())
    }

    pub async fn generate_pipeline(&self, draft: &PipelineDraft) -> Result<Pipeline, AppError> {
        let request = Request::post(&self.url(wire::GENERATE_PIPELINE_PATH))
            .json(draft)
            .map_err(|e| AppError::unknown(e.to_string()))?;
        read_json(request.send().await.map_err(network)?).await
    }

    pub async fn execute_pipeline(&self, pipeline_id: &str) -> Result<ExecuteResponse, AppError> {
        send(Request::post(&self.url(&wire::pipeline_execute_path(pipeline_id)))).await
    }

    pub async fn delete_pipeline(&self, pipeline_id: &str) -> Result<DeleteResponse, AppError> {
        send(Request::delete(&self.url(&wire::pipeline_path(pipeline_id)))).await
    }

    pub async fn list_pipelines(&self) -> Result<Vec<Pipeline>, AppError> {
        let list: PipelineList = send(Request::get(&self.url(wire::PIPELINES_PATH))).await?;
        Ok(list.into_vec())
    }
}

fn network(error: gloo_net::Error) -> AppError {
    gloo::console::warn!(format!("request failed: {}", error));
    AppError::network()
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AppError> {
    read_json(request.send().await.map_err(network)?).await
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    if !response.ok() {
        return Err(AppError::http(response.status()));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| AppError::unknown(format!("Unexpected response from server: {}", e)))
}
