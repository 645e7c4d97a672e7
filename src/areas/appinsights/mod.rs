//! Application Insights: diagnosis, data-set correlation, trace listing.

pub mod commands;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;

use crate::areas::Area;
use crate::command::{AreaManifest, RegistryBuilder, ServiceError, WiringError};
use commands::{
    AppCorrelateCommand, AppCorrelateOptions, AppDiagnoseCommand, AppDiagnoseOptions,
    AppTraceListCommand, AppTraceListOptions,
};
use models::{
    AppCorrelateCommandResult, AppDiagnoseCommandResult, AppDiagnosis, AppTraceListCommandResult,
    CorrelationFinding, TraceRecord,
};

pub const DECLARED: &[&str] = &[
    "appinsights app diagnose",
    "appinsights app correlate",
    "appinsights trace list",
];

#[async_trait]
pub trait AppInsightsService: Send + Sync {
    async fn diagnose(&self, options: &AppDiagnoseOptions) -> Result<AppDiagnosis, ServiceError>;

    async fn correlate(
        &self,
        options: &AppCorrelateOptions,
    ) -> Result<Vec<CorrelationFinding>, ServiceError>;

    async fn list_traces(
        &self,
        options: &AppTraceListOptions,
    ) -> Result<Vec<TraceRecord>, ServiceError>;
}

pub fn manifest() -> AreaManifest {
    AreaManifest::new(Area::AppInsights.as_str())
        .register::<AppDiagnoseCommandResult>()
        .register::<AppCorrelateCommandResult>()
        .register::<AppTraceListCommandResult>()
}

pub fn register(builder: &mut RegistryBuilder) -> Result<(), WiringError> {
    let service: Arc<dyn AppInsightsService> =
        builder.locator().service::<dyn AppInsightsService>()?;
    builder
        .area(Area::AppInsights, manifest(), DECLARED)
        .command(AppDiagnoseCommand::new(service.clone()))
        .command(AppCorrelateCommand::new(service.clone()))
        .command(AppTraceListCommand::new(service));
    Ok(())
}
