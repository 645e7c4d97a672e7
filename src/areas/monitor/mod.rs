//! Azure Monitor: Log Analytics workspaces, metric series, log queries.

pub mod commands;
pub mod models;
pub mod series;

use std::sync::Arc;

use async_trait::async_trait;

use crate::areas::Area;
use crate::areas::options::SubscriptionOptions;
use crate::command::{AreaManifest, RegistryBuilder, ServiceError, WiringError};
use commands::{
    LogQueryCommand, LogQueryOptions, MetricsQueryCommand, MetricsQueryOptions,
    WorkspaceListCommand,
};
use models::{
    LogQueryCommandResult, MetricSeries, MetricsQueryCommandResult, WorkspaceInfo,
    WorkspaceListCommandResult,
};

pub const DECLARED: &[&str] = &[
    "monitor workspace list",
    "monitor metrics query",
    "monitor log query",
];

#[async_trait]
pub trait MonitorService: Send + Sync {
    async fn list_workspaces(
        &self,
        subscription: &SubscriptionOptions,
    ) -> Result<Vec<WorkspaceInfo>, ServiceError>;

    async fn query_metrics(
        &self,
        options: &MetricsQueryOptions,
    ) -> Result<Vec<MetricSeries>, ServiceError>;

    async fn query_logs(
        &self,
        options: &LogQueryOptions,
    ) -> Result<Vec<serde_json::Value>, ServiceError>;
}

pub fn manifest() -> AreaManifest {
    AreaManifest::new(Area::Monitor.as_str())
        .register::<WorkspaceListCommandResult>()
        .register::<MetricsQueryCommandResult>()
        .register::<LogQueryCommandResult>()
}

pub fn register(builder: &mut RegistryBuilder) -> Result<(), WiringError> {
    let service: Arc<dyn MonitorService> = builder.locator().service::<dyn MonitorService>()?;
    builder
        .area(Area::Monitor, manifest(), DECLARED)
        .command(WorkspaceListCommand::new(service.clone()))
        .command(MetricsQueryCommand::new(service.clone()))
        .command(LogQueryCommand::new(service));
    Ok(())
}
