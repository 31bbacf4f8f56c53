//! Validators for file selection, pipeline drafts and ETL configs
//!
//! Every validator is pure and returns a [`ValidationResult`]; none of them
//! panics or returns `Err`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::analysis::AnalysisResults;
use crate::types::{
    EtlConfig, FileType, SourceConfig, TargetSelection, Transformation, WizardData,
};

/// Default upload limit (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Outcome of a validator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// All messages joined for a single error line
    pub fn message(&self) -> String {
        self.errors.join(", ")
    }
}

/// Limits applied to a file before upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRules {
    pub max_file_size: u64,
    /// Allowed extensions, lower-case and including the dot
    pub supported_file_types: Vec<String>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            supported_file_types: vec![".csv".to_string(), ".json".to_string(), ".xml".to_string()],
        }
    }
}

/// Name and size of a user-selected file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Lower-cased extension including the dot, empty when there is none
    pub fn extension(&self) -> String {
        match self.name.rfind('.') {
            Some(pos) => self.name[pos..].to_ascii_lowercase(),
            None => String::new(),
        }
    }
}

pub fn validate_file(file: Option<&FileInfo>, rules: &FileRules) -> ValidationResult {
    let Some(file) = file else {
        return ValidationResult::from_errors(vec!["No file selected".to_string()]);
    };

    let mut errors = Vec::new();

    if file.size > rules.max_file_size {
        errors.push(format!(
            "File size exceeds {}MB",
            rules.max_file_size / (1024 * 1024)
        ));
    }

    let extension = file.extension();
    if !rules.supported_file_types.iter().any(|t| *t == extension) {
        errors.push(format!(
            "Unsupported file type. Supported: {}",
            rules.supported_file_types.join(", ")
        ));
    }

    ValidationResult::from_errors(errors)
}

/// Payload sent to the generate-pipeline endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDraft {
    pub source: Option<SourceConfig>,
    pub target: Option<TargetSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etl_config: Option<EtlConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResults>,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
}

impl PipelineDraft {
    /// Draft assembled from everything the wizard collected so far
    pub fn from_wizard(data: &WizardData) -> Self {
        Self {
            source: data.source.clone(),
            target: data.target.clone(),
            etl_config: data.etl_config.clone(),
            analysis: data.analysis.clone(),
            transformations: data
                .etl_config
                .as_ref()
                .map(|c| c.transformations.clone())
                .unwrap_or_default(),
        }
    }
}

pub fn validate_pipeline_data(draft: &PipelineDraft) -> ValidationResult {
    let mut errors = Vec::new();

    if draft.source.is_none() {
        errors.push("No data source specified".to_string());
    }

    if draft.target.is_none() {
        errors.push("No target system specified".to_string());
    }

    if draft.transformations.is_empty() {
        errors.push("No data transformations specified".to_string());
    }

    ValidationResult::from_errors(errors)
}

pub fn validate_etl_config(config: &EtlConfig) -> ValidationResult {
    let mut errors = Vec::new();

    match &config.schedule {
        None => errors.push("No schedule specified".to_string()),
        Some(schedule) if !schedule.has_format() => {
            errors.push("No schedule format specified (cron or interval)".to_string())
        }
        Some(_) => {}
    }

    ValidationResult::from_errors(errors)
}

/// Upload `file_type` for a file name; `None` lets the server auto-detect
pub fn file_type_for(name: &str) -> Option<FileType> {
    name.rsplit_once('.')
        .and_then(|(_, ext)| FileType::from_extension(ext))
}

pub fn is_valid_url(candidate: &str) -> bool {
    url::Url::parse(candidate).is_ok()
}

pub fn is_valid_email(candidate: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
        .is_match(candidate)
}
