//! Backend used when no fixture document is configured. Every call fails as
//! unavailable so the envelope says so instead of returning empty results.

use async_trait::async_trait;
use serde_json::Value;

use crate::areas::appinsights::AppInsightsService;
use crate::areas::appinsights::commands::{
    AppCorrelateOptions, AppDiagnoseOptions, AppTraceListOptions,
};
use crate::areas::appinsights::models::{AppDiagnosis, CorrelationFinding, TraceRecord};
use crate::areas::monitor::MonitorService;
use crate::areas::monitor::commands::{LogQueryOptions, MetricsQueryOptions};
use crate::areas::monitor::models::{MetricSeries, WorkspaceInfo};
use crate::areas::options::SubscriptionOptions;
use crate::areas::servicebus::ServiceBusService;
use crate::areas::servicebus::commands::{NamespaceOptions, TopicOptions};
use crate::areas::servicebus::models::{SubscriptionDetails, TopicDetails};
use crate::command::ServiceError;

#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredBackend;

fn unavailable<T>(area: &str) -> Result<T, ServiceError> {
    Err(ServiceError::Unavailable(format!(
        "no {area} backend configured (set --fixtures or AZMCP_FIXTURES)"
    )))
}

#[async_trait]
impl AppInsightsService for UnconfiguredBackend {
    async fn diagnose(&self, _options: &AppDiagnoseOptions) -> Result<AppDiagnosis, ServiceError> {
        unavailable("appinsights")
    }

    async fn correlate(
        &self,
        _options: &AppCorrelateOptions,
    ) -> Result<Vec<CorrelationFinding>, ServiceError> {
        unavailable("appinsights")
    }

    async fn list_traces(
        &self,
        _options: &AppTraceListOptions,
    ) -> Result<Vec<TraceRecord>, ServiceError> {
        unavailable("appinsights")
    }
}

#[async_trait]
impl MonitorService for UnconfiguredBackend {
    async fn list_workspaces(
        &self,
        _subscription: &SubscriptionOptions,
    ) -> Result<Vec<WorkspaceInfo>, ServiceError> {
        unavailable("monitor")
    }

    async fn query_metrics(
        &self,
        _options: &MetricsQueryOptions,
    ) -> Result<Vec<MetricSeries>, ServiceError> {
        unavailable("monitor")
    }

    async fn query_logs(&self, _options: &LogQueryOptions) -> Result<Vec<Value>, ServiceError> {
        unavailable("monitor")
    }
}

#[async_trait]
impl ServiceBusService for UnconfiguredBackend {
    async fn list_topics(&self, _options: &NamespaceOptions) -> Result<Vec<String>, ServiceError> {
        unavailable("servicebus")
    }

    async fn topic_details(&self, _options: &TopicOptions) -> Result<TopicDetails, ServiceError> {
        unavailable("servicebus")
    }

    async fn list_subscriptions(
        &self,
        _options: &TopicOptions,
    ) -> Result<Vec<SubscriptionDetails>, ServiceError> {
        unavailable("servicebus")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_call_is_unavailable() {
        let opts = SubscriptionOptions {
            subscription: "s".into(),
            tenant: None,
        };
        let err = UnconfiguredBackend.list_workspaces(&opts).await.unwrap_err();
        assert_eq!(err.status(), 503);
        assert_eq!(err.public_message(), "The service is unavailable");
    }
}
