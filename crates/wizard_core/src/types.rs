//! Core types for the pipeline wizard
//!
//! This module defines the wizard's step positions, the per-step payloads
//! accumulated in [`WizardData`], and the server-owned pipeline entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::AnalysisResults;
use crate::targets::{TargetConfig, TargetSystem};

/// One of the six fixed wizard steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    DataSource,
    Analysis,
    TargetSystem,
    EtlConfig,
    Visualization,
    Monitoring,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::DataSource,
        WizardStep::Analysis,
        WizardStep::TargetSystem,
        WizardStep::EtlConfig,
        WizardStep::Visualization,
        WizardStep::Monitoring,
    ];

    /// Highest valid step index
    pub const LAST_INDEX: usize = 5;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn first() -> Self {
        WizardStep::DataSource
    }

    pub fn is_last(self) -> bool {
        self.index() == Self::LAST_INDEX
    }

    /// Following step, clamped at the last one
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(self)
    }

    /// Preceding step, `None` at the first one
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    /// Data key that must be present before leaving this step
    pub fn required_key(self) -> Option<DataKey> {
        match self {
            WizardStep::DataSource => Some(DataKey::Source),
            WizardStep::Analysis => Some(DataKey::Analysis),
            WizardStep::TargetSystem => Some(DataKey::Target),
            WizardStep::EtlConfig => Some(DataKey::EtlConfig),
            WizardStep::Visualization => Some(DataKey::Pipeline),
            WizardStep::Monitoring => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::DataSource => "Data source",
            WizardStep::Analysis => "Analysis",
            WizardStep::TargetSystem => "Target system",
            WizardStep::EtlConfig => "ETL configuration",
            WizardStep::Visualization => "Visualization",
            WizardStep::Monitoring => "Monitoring",
        }
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::first()
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Keys of the per-step payloads held in [`WizardData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKey {
    Source,
    Analysis,
    Target,
    EtlConfig,
    Pipeline,
    Monitoring,
}

impl DataKey {
    pub fn as_str(self) -> &'static str {
        match self {
            DataKey::Source => "source",
            DataKey::Analysis => "analysis",
            DataKey::Target => "target",
            DataKey::EtlConfig => "etl_config",
            DataKey::Pipeline => "pipeline",
            DataKey::Monitoring => "monitoring",
        }
    }

    /// Message shown when the step gate finds this key missing
    pub fn missing_message(self) -> &'static str {
        match self {
            DataKey::Source => "No data source selected",
            DataKey::Analysis => "Analysis has not been run",
            DataKey::Target => "No target system selected",
            DataKey::EtlConfig => "ETL configuration is not set",
            DataKey::Pipeline => "Pipeline has not been generated",
            DataKey::Monitoring => "Monitoring is not configured",
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payloads accumulated across the wizard, one slot per step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardData {
    pub source: Option<SourceConfig>,
    pub analysis: Option<AnalysisResults>,
    pub target: Option<TargetSelection>,
    pub etl_config: Option<EtlConfig>,
    pub pipeline: Option<Pipeline>,
    pub monitoring: Option<MonitoringState>,
}

impl WizardData {
    pub fn has(&self, key: DataKey) -> bool {
        match key {
            DataKey::Source => self.source.is_some(),
            DataKey::Analysis => self.analysis.is_some(),
            DataKey::Target => self.target.is_some(),
            DataKey::EtlConfig => self.etl_config.is_some(),
            DataKey::Pipeline => self.pipeline.is_some(),
            DataKey::Monitoring => self.monitoring.is_some(),
        }
    }

    /// Shallow merge: every slot present in `update` overwrites ours
    pub fn merge(&mut self, update: WizardUpdate) {
        let WizardUpdate {
            source,
            analysis,
            target,
            etl_config,
            pipeline,
            monitoring,
        } = update;

        if source.is_some() {
            self.source = source;
        }
        if analysis.is_some() {
            self.analysis = analysis;
        }
        if target.is_some() {
            self.target = target;
        }
        if etl_config.is_some() {
            self.etl_config = etl_config;
        }
        if pipeline.is_some() {
            self.pipeline = pipeline;
        }
        if monitoring.is_some() {
            self.monitoring = monitoring;
        }
    }
}

/// Partial update for [`WizardData`]; unset slots leave existing data alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardUpdate {
    pub source: Option<SourceConfig>,
    pub analysis: Option<AnalysisResults>,
    pub target: Option<TargetSelection>,
    pub etl_config: Option<EtlConfig>,
    pub pipeline: Option<Pipeline>,
    pub monitoring: Option<MonitoringState>,
}

impl WizardUpdate {
    pub fn source(source: SourceConfig) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    pub fn analysis(analysis: AnalysisResults) -> Self {
        Self {
            analysis: Some(analysis),
            ..Self::default()
        }
    }

    pub fn target(target: TargetSelection) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn etl_config(etl_config: EtlConfig) -> Self {
        Self {
            etl_config: Some(etl_config),
            ..Self::default()
        }
    }

    pub fn pipeline(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Some(pipeline),
            ..Self::default()
        }
    }

    pub fn monitoring(monitoring: MonitoringState) -> Self {
        Self {
            monitoring: Some(monitoring),
            ..Self::default()
        }
    }
}

/// Kind of data source picked on the first step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    File,
    Database,
    Stream,
}

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Json,
    Xml,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Json => "json",
            FileType::Xml => "xml",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(FileType::Csv),
            "json" => Some(FileType::Json),
            "xml" => Some(FileType::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step 0 payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

impl SourceConfig {
    /// True once the selected file made it to server storage
    pub fn is_uploaded(&self) -> bool {
        self.storage_path.is_some()
    }
}

/// Step 2 payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSelection {
    pub system: TargetSystem,
    pub config: TargetConfig,
}

impl TargetSelection {
    /// Select a target system with its default connection settings
    pub fn with_defaults(system: TargetSystem) -> Self {
        Self {
            system,
            config: system.default_config(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    #[default]
    Manual,
    Cron,
    Interval,
}

/// When a pipeline runs; either `cron` or `interval` (seconds) is expected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "type")]
    pub kind: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
}

impl Schedule {
    pub const DEFAULT_CRON: &'static str = "0 0 * * *";
    pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

    pub fn cron(expr: impl Into<String>) -> Self {
        Self {
            kind: ScheduleKind::Cron,
            cron: Some(expr.into()),
            interval: None,
        }
    }

    pub fn every(seconds: u64) -> Self {
        Self {
            kind: ScheduleKind::Interval,
            cron: None,
            interval: Some(seconds),
        }
    }

    /// Schedule of the given kind pre-filled the way the config screen does
    pub fn with_defaults(kind: ScheduleKind) -> Self {
        match kind {
            ScheduleKind::Manual => Self::default(),
            ScheduleKind::Cron => Self::cron(Self::DEFAULT_CRON),
            ScheduleKind::Interval => Self::every(Self::DEFAULT_INTERVAL_SECS),
        }
    }

    pub fn has_format(&self) -> bool {
        self.cron.as_deref().is_some_and(|c| !c.trim().is_empty()) || self.interval.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationKind {
    #[default]
    Filter,
    Map,
    Aggregate,
    Join,
    Deduplicate,
}

impl TransformationKind {
    pub const ALL: [TransformationKind; 5] = [
        TransformationKind::Filter,
        TransformationKind::Map,
        TransformationKind::Aggregate,
        TransformationKind::Join,
        TransformationKind::Deduplicate,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TransformationKind::Filter => "filter",
            TransformationKind::Map => "map",
            TransformationKind::Aggregate => "aggregate",
            TransformationKind::Join => "join",
            TransformationKind::Deduplicate => "deduplicate",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(id.trim()))
    }

    /// Default display name for a new transformation of this kind
    pub fn label(self) -> &'static str {
        match self {
            TransformationKind::Filter => "Filter rows",
            TransformationKind::Map => "Map columns",
            TransformationKind::Aggregate => "Aggregate",
            TransformationKind::Join => "Join",
            TransformationKind::Deduplicate => "Remove duplicates",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: TransformationKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

impl Transformation {
    pub fn new(id: u64, kind: TransformationKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            config: serde_json::Map::new(),
        }
    }
}

/// Step 3 payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
}

impl EtlConfig {
    pub fn add_transformation(&mut self, kind: TransformationKind, name: impl Into<String>) -> u64 {
        let id = self.transformations.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.transformations.push(Transformation::new(id, kind, name));
        id
    }

    pub fn remove_transformation(&mut self, id: u64) -> bool {
        let before = self.transformations.len();
        self.transformations.retain(|t| t.id != id);
        self.transformations.len() != before
    }
}

/// Server-side status of a pipeline or analysis job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Server-owned pipeline entity (step 4 payload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: JobStatus,
    pub source: SourceConfig,
    pub target: TargetSelection,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dag_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Execution state shown on the monitoring step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Ready,
    Running,
    Completed,
    Failed,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Step 5 payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringState {
    pub execution_status: ExecutionStatus,
    #[serde(default)]
    pub logs: Vec<ExecutionLogEntry>,
}

impl MonitoringState {
    /// Move to `status` and record why
    pub fn record(&mut self, status: ExecutionStatus, level: LogLevel, message: impl Into<String>) {
        self.execution_status = status;
        self.logs.push(ExecutionLogEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        });
    }
}
