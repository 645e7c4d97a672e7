use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::command::ResultType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub category: String,
    pub severity: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDiagnosis {
    pub resource_name: String,
    pub summary: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationFinding {
    pub data_set: String,
    pub related_data_set: String,
    pub score: f64,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    pub operation_id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDiagnoseCommandResult {
    pub diagnosis: AppDiagnosis,
}

impl ResultType for AppDiagnoseCommandResult {
    const TYPE_NAME: &'static str = "AppDiagnoseCommandResult";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCorrelateCommandResult {
    pub correlations: Vec<CorrelationFinding>,
}

impl ResultType for AppCorrelateCommandResult {
    const TYPE_NAME: &'static str = "AppCorrelateCommandResult";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppTraceListCommandResult {
    pub table: String,
    pub traces: Vec<TraceRecord>,
}

impl ResultType for AppTraceListCommandResult {
    const TYPE_NAME: &'static str = "AppTraceListCommandResult";
}
