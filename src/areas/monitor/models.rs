use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::command::ResultType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    pub name: String,
    pub customer_id: Uuid,
    pub location: String,
}

/// One metric time series. `values` stays a plain number array on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    pub name: String,
    pub unit: String,
    pub aggregation: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceListCommandResult {
    pub workspaces: Vec<WorkspaceInfo>,
}

impl ResultType for WorkspaceListCommandResult {
    const TYPE_NAME: &'static str = "WorkspaceListCommandResult";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQueryCommandResult {
    pub metrics: Vec<MetricSeries>,
}

impl ResultType for MetricsQueryCommandResult {
    const TYPE_NAME: &'static str = "MetricsQueryCommandResult";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQueryCommandResult {
    pub table: String,
    pub rows: Vec<serde_json::Value>,
}

impl ResultType for LogQueryCommandResult {
    const TYPE_NAME: &'static str = "LogQueryCommandResult";
}
