//! In-memory backend state

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use wizard_core::{FileType, Pipeline};

/// Knobs for the mock backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockConfig {
    /// Status checks answered with 202 before a job completes
    pub processing_polls: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            processing_polls: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StoredFile {
    pub name: String,
    pub size: u64,
    pub file_type: Option<FileType>,
}

#[derive(Debug, Clone)]
pub(crate) struct AnalysisJob {
    pub file_id: String,
    pub remaining_polls: u32,
}

#[derive(Debug, Default)]
pub(crate) struct Store {
    pub files: HashMap<String, StoredFile>,
    pub jobs: HashMap<String, AnalysisJob>,
    /// Kept in creation order
    pub pipelines: Vec<Pipeline>,
}

impl Store {
    pub fn pipeline_mut(&mut self, id: &str) -> Option<&mut Pipeline> {
        self.pipelines.iter_mut().find(|p| p.id == id)
    }
}

/// Shared handler state
#[derive(Clone, Default)]
pub struct AppState {
    pub(crate) config: MockConfig,
    pub(crate) store: Arc<RwLock<Store>>,
}

impl AppState {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            store: Arc::default(),
        }
    }
}
