//! Request and response bodies of the pipeline HTTP API
//!
//! Paths are relative to the configured base URL (e.g. `http://host/api/v1`).

use serde::{Deserialize, Serialize};

use crate::analysis::RawAnalysisResult;
use crate::types::{JobStatus, Pipeline};

pub const UPLOAD_PATH: &str = "/files/upload";
pub const ANALYSIS_START_PATH: &str = "/analysis/start";
pub const GENERATE_PIPELINE_PATH: &str = "/generate-pipeline";
pub const PIPELINES_PATH: &str = "/pipelines";

pub fn analysis_status_path(analysis_id: &str) -> String {
    format!("/analysis/status/{}", analysis_id)
}

pub fn pipeline_path(pipeline_id: &str) -> String {
    format!("/pipeline/{}", pipeline_id)
}

pub fn pipeline_execute_path(pipeline_id: &str) -> String {
    format!("/pipeline/{}/execute", pipeline_id)
}

/// Where the server keeps an uploaded file; analysis is started against it
pub fn storage_path(file_id: &str, file_name: &str) -> String {
    format!("/files/{}/{}", file_id, file_name)
}

/// Response of `POST /files/upload`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Body of `POST /analysis/start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartAnalysisRequest {
    pub file_id: String,
    pub user_id: String,
    pub file_path: String,
}

/// Response of `POST /analysis/start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartAnalysisResponse {
    #[serde(alias = "pipeline_id")]
    pub analysis_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a `200` from `GET /analysis/status/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<RawAnalysisResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What a single status check found out
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisPoll {
    /// Job accepted but not finished (HTTP 202, or a pending/running status)
    Processing,
    Completed(RawAnalysisResult),
    Failed(String),
}

impl AnalysisStatusResponse {
    /// Interpret a `200` body; a completed job without a result is a failure
    pub fn into_poll(self) -> AnalysisPoll {
        match self.status {
            JobStatus::Pending | JobStatus::Running => AnalysisPoll::Processing,
            JobStatus::Completed => match self.result {
                Some(result) => AnalysisPoll::Completed(result),
                None => AnalysisPoll::Failed("Analysis completed without a result".to_string()),
            },
            JobStatus::Failed => AnalysisPoll::Failed(
                self.error
                    .unwrap_or_else(|| "Analysis failed on the server".to_string()),
            ),
        }
    }
}

/// Response of `POST /pipeline/{id}/execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub pipeline_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `DELETE /pipeline/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub pipeline_id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Response of `GET /pipelines`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineList {
    Bare(Vec<Pipeline>),
    Wrapped { pipelines: Vec<Pipeline> },
}

impl PipelineList {
    pub fn into_vec(self) -> Vec<Pipeline> {
        match self {
            PipelineList::Bare(list) => list,
            PipelineList::Wrapped { pipelines } => pipelines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storage_path_layout() {
        assert_eq!(storage_path("f-1", "sales.csv"), "/files/f-1/sales.csv");
    }

    #[test]
    fn test_start_response_accepts_pipeline_id_alias() {
        let response: StartAnalysisResponse =
            serde_json::from_value(json!({ "pipeline_id": "p-1", "status": "started" })).unwrap();
        assert_eq!(response.analysis_id, "p-1");
    }

    #[test]
    fn test_running_status_is_processing() {
        let response: AnalysisStatusResponse =
            serde_json::from_value(json!({ "status": "running" })).unwrap();
        assert_eq!(response.into_poll(), AnalysisPoll::Processing);
    }

    #[test]
    fn test_completed_without_result_fails() {
        let response: AnalysisStatusResponse =
            serde_json::from_value(json!({ "status": "completed" })).unwrap();
        assert!(matches!(response.into_poll(), AnalysisPoll::Failed(_)));
    }

    #[test]
    fn test_failed_status_keeps_server_message() {
        let response: AnalysisStatusResponse =
            serde_json::from_value(json!({ "status": "failed", "error": "bad encoding" })).unwrap();
        assert_eq!(response.into_poll(), AnalysisPoll::Failed("bad encoding".to_string()));
    }

    #[test]
    fn test_pipeline_list_shapes() {
        let bare: PipelineList = serde_json::from_value(json!([])).unwrap();
        assert!(bare.into_vec().is_empty());
        let wrapped: PipelineList = serde_json::from_value(json!({ "pipelines": [] })).unwrap();
        assert!(wrapped.into_vec().is_empty());
    }

    #[test]
    fn test_paths() {
        assert_eq!(analysis_status_path("a1"), "/analysis/status/a1");
        assert_eq!(pipeline_execute_path("p1"), "/pipeline/p1/execute");
    }
}
