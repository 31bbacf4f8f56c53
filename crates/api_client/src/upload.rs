//! File selection and upload

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use wizard_core::validators::{file_type_for, validate_file, FileInfo, FileRules};
use wizard_core::wire::storage_path;
use wizard_core::AppError;

use crate::client::PipelineApi;
use crate::error::ApiError;
use crate::state::OperationState;

/// A file picked for upload, with its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub info: FileInfo,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let info = FileInfo::new(name, bytes.len() as u64);
        Self { info, bytes }
    }

    /// Load a file from disk, keeping only its file name
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::Config(format!("not a file path: {}", path.display())))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn size(&self) -> u64 {
        self.info.size
    }
}

/// What a successful upload produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub file_id: String,
    pub message: Option<String>,
    /// `/files/{file_id}/{file_name}`
    pub storage_path: String,
}

/// Upload controller: validates the selected file locally, then sends it
pub struct FileUploadController {
    api: Arc<dyn PipelineApi>,
    rules: FileRules,
    selected: Option<SelectedFile>,
    storage_path: Option<String>,
    state: OperationState,
    result: Option<UploadOutcome>,
}

impl FileUploadController {
    pub fn new(api: Arc<dyn PipelineApi>) -> Self {
        Self::with_rules(api, FileRules::default())
    }

    pub fn with_rules(api: Arc<dyn PipelineApi>, rules: FileRules) -> Self {
        Self {
            api,
            rules,
            selected: None,
            storage_path: None,
            state: OperationState::default(),
            result: None,
        }
    }

    /// Replace the selection. Returns whether the new selection is valid;
    /// an invalid one is still kept so the caller can show it.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> bool {
        self.storage_path = None;
        self.result = None;
        self.state.reset();

        let validation = validate_file(file.as_ref().map(|f| &f.info), &self.rules);
        self.selected = file;

        if !validation.is_valid {
            self.state.reject(AppError::invalid(&validation.errors));
        }
        validation.is_valid
    }

    /// Upload the selected file. `None` means the attempt failed and
    /// [`error`](Self::error) says why.
    pub async fn upload(&mut self) -> Option<UploadOutcome> {
        let attempt = self.state.begin();

        let validation = validate_file(self.selected.as_ref().map(|f| &f.info), &self.rules);
        if !validation.is_valid {
            attempt.reject(AppError::invalid(&validation.errors));
            return None;
        }
        let file = self.selected.as_ref()?;
        debug!(file = %file.name(), "uploading selected file");

        let response =
            attempt.settle(self.api.upload_file(file, file_type_for(file.name())).await)?;

        let path = storage_path(&response.file_id, file.name());
        info!(file_id = %response.file_id, %path, "file uploaded");

        let outcome = UploadOutcome {
            file_id: response.file_id,
            message: response.message,
            storage_path: path.clone(),
        };
        self.storage_path = Some(path);
        self.result = Some(outcome.clone());
        Some(outcome)
    }

    /// Id of the uploaded file, read back from the storage path
    pub fn file_id(&self) -> Option<&str> {
        self.storage_path
            .as_deref()?
            .strip_prefix("/files/")?
            .split('/')
            .next()
            .filter(|id| !id.is_empty())
    }

    pub fn reset(&mut self) {
        self.selected = None;
        self.storage_path = None;
        self.result = None;
        self.state.reset();
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn storage_path(&self) -> Option<&str> {
        self.storage_path.as_deref()
    }

    pub fn result(&self) -> Option<&UploadOutcome> {
        self.result.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }
}
