//! HTTP handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use wizard_core::validators::{file_type_for, validate_pipeline_data};
use wizard_core::wire::{
    self, AnalysisStatusResponse, DeleteResponse, ExecuteResponse, PipelineList,
    StartAnalysisRequest, StartAnalysisResponse, UploadResponse,
};
use wizard_core::{FileType, JobStatus, Pipeline, PipelineDraft, StageStatus};

use crate::fixtures;
use crate::store::{AnalysisJob, AppState, StoredFile};

pub const API_PREFIX: &str = "/api/v1";

/// Full router with the API mounted under [`API_PREFIX`]
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(wire::UPLOAD_PATH, post(upload_file))
        .route(wire::ANALYSIS_START_PATH, post(start_analysis))
        .route("/analysis/status/:id", get(analysis_status))
        .route(wire::GENERATE_PIPELINE_PATH, post(generate_pipeline))
        .route("/pipeline/:id", get(get_pipeline).delete(delete_pipeline))
        .route("/pipeline/:id/execute", post(execute_pipeline))
        .route(wire::PIPELINES_PATH, get(list_pipelines));

    Router::new()
        .route("/health", get(health_check))
        .nest(API_PREFIX, api)
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    warn!(status = status.as_u16(), %message, "request rejected");
    (status, Json(json!({ "error": message }))).into_response()
}

async fn health_check() -> &'static str {
    "OK"
}

async fn upload_file(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload: Option<(String, u64)> = None;
    let mut declared_type: Option<FileType> = None;
    let mut user_id = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or("upload").to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((name, bytes.len() as u64)),
                    Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
                }
            }
            "file_type" => {
                declared_type = field.text().await.ok().and_then(|t| FileType::from_extension(&t));
            }
            "user_id" => user_id = field.text().await.ok(),
            _ => {}
        }
    }

    let Some((name, size)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    let file_id = uuid::Uuid::new_v4().to_string();
    let file = StoredFile {
        file_type: declared_type.or_else(|| file_type_for(&name)),
        name: name.clone(),
        size,
    };
    info!(%file_id, file = %name, size, user = user_id.as_deref().unwrap_or("-"), "file stored");
    state.store.write().await.files.insert(file_id.clone(), file);

    Json(UploadResponse {
        file_id,
        message: Some("File uploaded successfully".to_string()),
        file_name: Some(name),
        file_size: Some(size),
    })
    .into_response()
}

async fn start_analysis(
    State(state): State<AppState>,
    Json(request): Json<StartAnalysisRequest>,
) -> Response {
    let mut store = state.store.write().await;
    if !store.files.contains_key(&request.file_id) {
        return error_response(StatusCode::NOT_FOUND, "File not found");
    }

    let analysis_id = uuid::Uuid::new_v4().to_string();
    store.jobs.insert(
        analysis_id.clone(),
        AnalysisJob {
            file_id: request.file_id.clone(),
            remaining_polls: state.config.processing_polls,
        },
    );
    info!(%analysis_id, file_id = %request.file_id, user = %request.user_id, "analysis started");

    Json(StartAnalysisResponse {
        analysis_id,
        status: Some("started".to_string()),
        message: Some("Analysis started".to_string()),
    })
    .into_response()
}

async fn analysis_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut guard = state.store.write().await;
    let store = &mut *guard;

    let Some(job) = store.jobs.get_mut(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Analysis not found");
    };

    if job.remaining_polls > 0 {
        job.remaining_polls -= 1;
        debug!(analysis_id = %id, remaining = job.remaining_polls, "analysis still processing");
        return (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "running", "message": "Analysis in progress" })),
        )
            .into_response();
    }

    let body = match store.files.get(&job.file_id) {
        Some(file) if file.size == 0 => AnalysisStatusResponse {
            status: JobStatus::Failed,
            result: None,
            error: Some("Uploaded file is empty".to_string()),
        },
        Some(file) => AnalysisStatusResponse {
            status: JobStatus::Completed,
            result: Some(fixtures::analysis_for(file)),
            error: None,
        },
        None => AnalysisStatusResponse {
            status: JobStatus::Failed,
            result: None,
            error: Some("Source file is no longer available".to_string()),
        },
    };
    Json(body).into_response()
}

async fn generate_pipeline(
    State(state): State<AppState>,
    Json(draft): Json<PipelineDraft>,
) -> Response {
    let validation = validate_pipeline_data(&draft);
    let (Some(source), Some(target), true) = (draft.source, draft.target, validation.is_valid)
    else {
        return error_response(StatusCode::BAD_REQUEST, validation.message());
    };

    let dag_code = draft
        .analysis
        .as_ref()
        .filter(|a| a.stages.etl_build.status == StageStatus::Success)
        .map(|a| a.stages.etl_build.result.python_code.clone())
        .unwrap_or_else(|| {
            let table = fixtures::table_name(source.file_name.as_deref().unwrap_or_default());
            fixtures::dag_code(&table, target.system)
        });

    let now = Utc::now();
    let pipeline = Pipeline {
        id: uuid::Uuid::new_v4().to_string(),
        name: Some(format!(
            "{} to {}",
            source.file_name.as_deref().unwrap_or("source"),
            target.system
        )),
        status: JobStatus::Pending,
        source,
        target,
        transformations: draft.transformations,
        schedule: draft.etl_config.and_then(|c| c.schedule),
        dag_code: Some(dag_code),
        created_at: now,
        updated_at: now,
    };
    info!(pipeline_id = %pipeline.id, "pipeline generated");

    state.store.write().await.pipelines.push(pipeline.clone());
    Json(pipeline).into_response()
}

async fn get_pipeline(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let store = state.store.read().await;
    match store.pipelines.iter().find(|p| p.id == id) {
        Some(pipeline) => Json(pipeline.clone()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Pipeline not found"),
    }
}

async fn execute_pipeline(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut store = state.store.write().await;
    let Some(pipeline) = store.pipeline_mut(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Pipeline not found");
    };

    pipeline.status = JobStatus::Completed;
    pipeline.updated_at = Utc::now();
    info!(pipeline_id = %id, "pipeline executed");

    Json(ExecuteResponse {
        pipeline_id: id,
        status: JobStatus::Completed,
        message: Some("Pipeline executed successfully".to_string()),
    })
    .into_response()
}

async fn delete_pipeline(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut store = state.store.write().await;
    let before = store.pipelines.len();
    store.pipelines.retain(|p| p.id != id);
    if store.pipelines.len() == before {
        return error_response(StatusCode::NOT_FOUND, "Pipeline not found");
    }
    info!(pipeline_id = %id, "pipeline deleted");

    Json(DeleteResponse {
        pipeline_id: id,
        deleted: true,
    })
    .into_response()
}

async fn list_pipelines(State(state): State<AppState>) -> Json<PipelineList> {
    let store = state.store.read().await;
    Json(PipelineList::Wrapped {
        pipelines: store.pipelines.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockConfig;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "wizard-test-boundary";

    fn app(processing_polls: u32) -> Router {
        router(AppState::new(MockConfig { processing_polls }))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn upload_request(file_name: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{contents}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"user_id\"\r\n\r\nanalyst\r\n\
             --{b}--\r\n",
            b = BOUNDARY,
            name = file_name,
            contents = contents,
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/files/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn upload_and_start(app: &Router, file_name: &str, contents: &str) -> String {
        let (status, body) = send(app, upload_request(file_name, contents)).await;
        assert_eq!(status, StatusCode::OK);
        let file_id = body["file_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/v1/analysis/start",
                json!({ "file_id": file_id, "user_id": "analyst", "file_path": "/files/x" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["analysis_id"].as_str().unwrap().to_string()
    }

    fn draft() -> Value {
        json!({
            "source": { "type": "file", "file_name": "orders.csv" },
            "target": {
                "system": "postgresql",
                "config": { "kind": "postgresql", "host": "localhost", "port": 5432,
                            "database": "analytics", "username": "user", "ssl": false }
            },
            "transformations": [
                { "id": 1, "type": "filter", "name": "drop nulls", "config": {} }
            ]
        })
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app(0).oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analysis_reports_processing_then_completes() {
        let app = app(2);
        let id = upload_and_start(&app, "orders.csv", "id,amount\n1,10\n").await;
        let uri = format!("/api/v1/analysis/status/{}", id);

        for _ in 0..2 {
            let (status, _) = send(&app, empty_request("GET", &uri)).await;
            assert_eq!(status, StatusCode::ACCEPTED);
        }

        let (status, body) = send(&app, empty_request("GET", &uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["result"]["storage_recommendation"]["value"], "PostgreSQL");
    }

    #[tokio::test]
    async fn test_empty_file_fails_analysis() {
        let app = app(0);
        let id = upload_and_start(&app, "empty.csv", "").await;

        let (status, body) = send(
            &app,
            empty_request("GET", &format!("/api/v1/analysis/status/{}", id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failed");
        assert_eq!(body["error"], "Uploaded file is empty");
    }

    #[tokio::test]
    async fn test_start_for_unknown_file_is_404() {
        let (status, _) = send(
            &app(0),
            json_request(
                "POST",
                "/api/v1/analysis/start",
                json!({ "file_id": "nope", "user_id": "u", "file_path": "/files/nope" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_rejects_incomplete_draft() {
        let (status, body) = send(
            &app(0),
            json_request("POST", "/api/v1/generate-pipeline", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("No data source specified"));
    }

    #[tokio::test]
    async fn test_pipeline_lifecycle() {
        let app = app(0);

        let (status, pipeline) = send(
            &app,
            json_request("POST", "/api/v1/generate-pipeline", draft()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pipeline["status"], "pending");
        let id = pipeline["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            empty_request("POST", &format!("/api/v1/pipeline/{}/execute", id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");

        let (_, body) = send(&app, empty_request("GET", &format!("/api/v1/pipeline/{}", id))).await;
        assert_eq!(body["status"], "completed");

        let (status, _) = send(
            &app,
            empty_request("DELETE", &format!("/api/v1/pipeline/{}", id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, empty_request("GET", "/api/v1/pipelines")).await;
        assert_eq!(body["pipelines"].as_array().unwrap().len(), 0);

        let (status, _) = send(&app, empty_request("GET", &format!("/api/v1/pipeline/{}", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
