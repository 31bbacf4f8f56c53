//! Analysis results: the raw payload the backend produces for a completed job
//! and the stage-keyed shape the wizard renders.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Summary the backend emits when it produced no report
pub const REPORT_NOT_GENERATED: &str = "Отчёт не сгенерирован.";

/// Fragment found in commentaries the model corrupted
pub const CORRUPTED_COMMENTARY_MARKER: &str = "commentary to=assistant";

pub const DEFAULT_REASONING: &str = "PostgreSQL is recommended for OLTP workloads";

const NO_ETL_CODE: &str = "No ETL pipeline is required for this type of data";
const NO_REPORT_SUMMARY: &str =
    "No automatic report was generated. See the recommendations below.";

/// Raw result of a completed analysis job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysisResult {
    pub data_analysis: DataAnalysis,
    pub storage_recommendation: StorageRecommendation,
    #[serde(default)]
    pub ddl_scripts: Vec<DdlScript>,
    #[serde(default)]
    pub dag_code: Option<String>,
    #[serde(default)]
    pub optimized_queries: Vec<OptimizedQuery>,
    #[serde(default)]
    pub user_report: Option<String>,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub agents_used: Vec<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataAnalysis {
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub characteristics: Option<DataCharacteristics>,
    #[serde(default)]
    pub structure: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataCharacteristics {
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub update_frequency: Option<String>,
    #[serde(default)]
    pub complexity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecommendation {
    pub value: String,
    #[serde(default)]
    pub commentary: Option<String>,
    #[serde(default)]
    pub config: Option<Value>,
}

impl StorageRecommendation {
    /// Commentary, or a fallback when it is missing or corrupted
    pub fn reasoning(&self) -> String {
        match self.commentary.as_deref() {
            Some(text) if !text.trim().is_empty() && !text.contains(CORRUPTED_COMMENTARY_MARKER) => {
                text.to_string()
            }
            _ if !self.value.trim().is_empty() => self.value.clone(),
            _ => DEFAULT_REASONING.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DdlScript {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedQuery {
    pub query: String,
    #[serde(default)]
    pub optimization: Option<String>,
}

/// Stages of the analysis, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    DataAnalysis,
    StorageSelection,
    DdlGeneration,
    EtlBuild,
    QueryOptimization,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::DataAnalysis,
        Stage::StorageSelection,
        Stage::DdlGeneration,
        Stage::EtlBuild,
        Stage::QueryOptimization,
        Stage::Report,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::DataAnalysis => "data-analysis",
            Stage::StorageSelection => "storage-selection",
            Stage::DdlGeneration => "ddl-generation",
            Stage::EtlBuild => "etl-build",
            Stage::QueryOptimization => "query-optimization",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome<T> {
    pub status: StageStatus,
    pub result: T,
}

impl<T> StageOutcome<T> {
    fn success(result: T) -> Self {
        Self {
            status: StageStatus::Success,
            result,
        }
    }

    fn skipped_unless(ran: bool, result: T) -> Self {
        Self {
            status: if ran {
                StageStatus::Success
            } else {
                StageStatus::Skipped
            },
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSelection {
    pub recommended_storage: String,
    pub reasoning: String,
    #[serde(default)]
    pub config: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdlGeneration {
    pub ddl_scripts: Vec<DdlScript>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlBuild {
    pub python_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptimization {
    pub optimizations: Vec<String>,
    pub indexes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub summary: String,
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResults {
    pub data_analysis: StageOutcome<DataAnalysis>,
    pub storage_selection: StageOutcome<StorageSelection>,
    pub ddl_generation: StageOutcome<DdlGeneration>,
    pub etl_build: StageOutcome<EtlBuild>,
    pub query_optimization: StageOutcome<QueryOptimization>,
    pub report: StageOutcome<ReportSummary>,
}

impl StageResults {
    pub fn status(&self, stage: Stage) -> StageStatus {
        match stage {
            Stage::DataAnalysis => self.data_analysis.status,
            Stage::StorageSelection => self.storage_selection.status,
            Stage::DdlGeneration => self.ddl_generation.status,
            Stage::EtlBuild => self.etl_build.status,
            Stage::QueryOptimization => self.query_optimization.status,
            Stage::Report => self.report.status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub processing_time: Option<f64>,
    pub agents_used: Vec<String>,
    pub tools_used: Vec<String>,
    pub confidence_score: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Normalized analysis result stored in the wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub message: String,
    pub stages: StageResults,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResults {
    /// Stage names with their status, in display order
    pub fn stage_statuses(&self) -> Vec<(Stage, StageStatus)> {
        Stage::ALL
            .iter()
            .map(|&stage| (stage, self.stages.status(stage)))
            .collect()
    }

    pub fn recommended_storage(&self) -> &str {
        &self.stages.storage_selection.result.recommended_storage
    }
}

/// Convert a completed job's raw payload into [`AnalysisResults`]
pub fn normalize(raw: RawAnalysisResult) -> AnalysisResults {
    let storage = &raw.storage_recommendation;
    let recommended = storage.value.clone();

    let indexes = raw
        .ddl_scripts
        .iter()
        .filter_map(|ddl| ddl.script.as_deref())
        .filter(|script| script.contains("CREATE INDEX"))
        .map(str::to_string)
        .collect();

    let optimizations: Vec<String> = raw
        .optimized_queries
        .iter()
        .map(|q| q.query.clone())
        .collect();

    let dag_code = raw.dag_code.as_deref().filter(|code| !code.trim().is_empty());

    let report_text = raw
        .user_report
        .as_deref()
        .filter(|text| !text.trim().is_empty() && *text != REPORT_NOT_GENERATED);

    let mut recommendations = vec![
        format!("Recommended storage: {}", recommended),
        format!("Analysis confidence: {:.1}%", raw.confidence_score * 100.0),
    ];
    if let Some(data_type) = &raw.data_analysis.data_type {
        recommendations.push(format!("Data type: {}", data_type));
    }
    if let Some(volume) = raw
        .data_analysis
        .characteristics
        .as_ref()
        .and_then(|c| c.volume.as_ref())
    {
        recommendations.push(format!("Volume: {}", volume));
    }
    recommendations.extend(optimizations.iter().take(3).cloned());

    let next_steps = vec![
        format!("Provision the {} database", recommended),
        "Run the provided DDL scripts to create the tables".to_string(),
        "Apply the suggested query optimizations".to_string(),
        "Schedule regular data refreshes".to_string(),
    ];

    let stages = StageResults {
        data_analysis: StageOutcome::success(raw.data_analysis.clone()),
        storage_selection: StageOutcome::success(StorageSelection {
            recommended_storage: recommended.clone(),
            reasoning: storage.reasoning(),
            config: storage.config.clone(),
        }),
        ddl_generation: StageOutcome::success(DdlGeneration {
            ddl_scripts: raw.ddl_scripts.clone(),
        }),
        etl_build: StageOutcome::skipped_unless(
            dag_code.is_some(),
            EtlBuild {
                python_code: dag_code.unwrap_or(NO_ETL_CODE).to_string(),
            },
        ),
        query_optimization: StageOutcome::success(QueryOptimization {
            optimizations,
            indexes,
        }),
        report: StageOutcome::skipped_unless(
            report_text.is_some(),
            ReportSummary {
                summary: report_text.unwrap_or(NO_REPORT_SUMMARY).to_string(),
                recommendations,
                next_steps,
            },
        ),
    };

    AnalysisResults {
        message: "Analysis completed successfully".to_string(),
        stages,
        metadata: AnalysisMetadata {
            processing_time: raw.processing_time,
            agents_used: raw.agents_used,
            tools_used: raw.tools_used,
            confidence_score: raw.confidence_score,
            errors: raw.errors,
            warnings: raw.warnings,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_payload() -> Value {
        json!({
            "status": "completed",
            "processing_time": 3.5,
            "confidence_score": 0.87,
            "agents_used": ["DATA_ANALYZER", "DB_SELECTOR"],
            "tools_used": ["pandas"],
            "data_analysis": {
                "data_type": "Transactional data",
                "quality_score": 0.92,
                "characteristics": { "volume": "~100,000 rows" }
            },
            "storage_recommendation": {
                "value": "PostgreSQL",
                "commentary": "Good ACID support.",
                "config": { "partitioning": "by date" }
            },
            "ddl_scripts": [
                { "type": "CREATE_TABLE", "name": "t", "script": "CREATE TABLE t (id INT);" },
                { "type": "CREATE_INDEX", "name": "i", "script": "CREATE INDEX i ON t(id);" }
            ],
            "optimized_queries": [
                { "query": "SELECT 1", "optimization": "none" },
                { "query": "SELECT 2" },
                { "query": "SELECT 3" },
                { "query": "SELECT 4" }
            ],
            "dag_code": "from airflow import DAG",
            "user_report": "Looks healthy.",
            "errors": [],
            "warnings": ["add validation"]
        })
    }

    fn parse(value: Value) -> RawAnalysisResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_full_payload() {
        let results = normalize(parse(raw_payload()));

        assert!(results
            .stage_statuses()
            .iter()
            .all(|(_, status)| *status == StageStatus::Success));
        assert_eq!(results.recommended_storage(), "PostgreSQL");
        assert_eq!(results.stages.storage_selection.result.reasoning, "Good ACID support.");
        assert_eq!(
            results.stages.query_optimization.result.indexes,
            vec!["CREATE INDEX i ON t(id);".to_string()]
        );
        assert_eq!(results.stages.query_optimization.result.optimizations.len(), 4);
        assert_eq!(results.metadata.warnings, vec!["add validation".to_string()]);
    }

    #[test]
    fn test_report_recommendations() {
        let results = normalize(parse(raw_payload()));
        let recs = &results.stages.report.result.recommendations;

        assert_eq!(recs[0], "Recommended storage: PostgreSQL");
        assert_eq!(recs[1], "Analysis confidence: 87.0%");
        assert_eq!(recs[2], "Data type: Transactional data");
        assert_eq!(recs[3], "Volume: ~100,000 rows");
        // only the first three optimized queries
        assert_eq!(recs.len(), 7);
    }

    #[test]
    fn test_etl_stage_skipped_without_dag_code() {
        let mut payload = raw_payload();
        payload["dag_code"] = Value::Null;
        let results = normalize(parse(payload));

        assert_eq!(results.stages.etl_build.status, StageStatus::Skipped);
        assert!(!results.stages.etl_build.result.python_code.is_empty());
    }

    #[test]
    fn test_report_stage_skipped_on_sentinel() {
        let mut payload = raw_payload();
        payload["user_report"] = json!(REPORT_NOT_GENERATED);
        let results = normalize(parse(payload));

        assert_eq!(results.stages.report.status, StageStatus::Skipped);
        assert_ne!(results.stages.report.result.summary, REPORT_NOT_GENERATED);
        assert_eq!(results.stages.status(Stage::Report), StageStatus::Skipped);
    }

    #[test]
    fn test_corrupted_commentary_falls_back_to_value() {
        let mut payload = raw_payload();
        payload["storage_recommendation"]["commentary"] =
            json!("<|channel|>commentary to=assistant garbage");
        let results = normalize(parse(payload));

        assert_eq!(results.stages.storage_selection.result.reasoning, "PostgreSQL");
    }

    #[test]
    fn test_missing_commentary_and_value_uses_default() {
        let recommendation = StorageRecommendation {
            value: String::new(),
            commentary: None,
            config: None,
        };
        assert_eq!(recommendation.reasoning(), DEFAULT_REASONING);
    }

    #[test]
    fn test_minimal_payload_parses() {
        let raw = parse(json!({
            "data_analysis": {},
            "storage_recommendation": { "value": "ClickHouse" }
        }));
        let results = normalize(raw);
        assert_eq!(results.stages.etl_build.status, StageStatus::Skipped);
        assert_eq!(results.stages.report.status, StageStatus::Skipped);
        assert_eq!(results.recommended_storage(), "ClickHouse");
    }

    #[test]
    fn test_stage_names_are_kebab_case() {
        assert_eq!(serde_json::to_value(Stage::QueryOptimization).unwrap(), "query-optimization");
        assert_eq!(Stage::EtlBuild.to_string(), "etl-build");
    }
}
