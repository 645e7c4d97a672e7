/*!
Fixture backend: canned Azure state loaded from a YAML or JSON document.

One document serves all three areas. Lookups are case-insensitive on names;
a miss is `ServiceError::NotFound`, and any subscription listed under
`forbiddenSubscriptions` is refused with `ServiceError::Forbidden`.

Metric samples are laid out from `start`, one every `grain`, and shaped by
the query window, interval and aggregation. Log rows are kept when their
`TimeGenerated` falls within `hours` of `asOf` (the current time when unset);
rows without a parseable `TimeGenerated` are always kept.
*/

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::areas::appinsights::AppInsightsService;
use crate::areas::appinsights::commands::{
    AppCorrelateOptions, AppDiagnoseOptions, AppTraceListOptions,
};
use crate::areas::appinsights::models::{AppDiagnosis, CorrelationFinding, Finding, TraceRecord};
use crate::areas::monitor::MonitorService;
use crate::areas::monitor::commands::{LogQueryOptions, MetricsQueryOptions};
use crate::areas::monitor::models::{MetricSeries, WorkspaceInfo};
use crate::areas::monitor::series::{aggregate, parse_interval};
use crate::areas::options::SubscriptionOptions;
use crate::areas::servicebus::ServiceBusService;
use crate::areas::servicebus::commands::{NamespaceOptions, TopicOptions};
use crate::areas::servicebus::models::{SubscriptionDetails, TopicDetails};
use crate::command::ServiceError;

/* -------------------------------------------------------------------------- */
/* Document                                                                   */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixtureDocument {
    /// Reference time for relative windows such as `hours`.
    pub as_of: Option<DateTime<Utc>>,
    pub forbidden_subscriptions: Vec<String>,
    pub app_insights: AppInsightsFixture,
    pub monitor: MonitorFixture,
    pub service_bus: ServiceBusFixture,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppInsightsFixture {
    pub components: Vec<ComponentFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFixture {
    pub resource_name: String,
    #[serde(default)]
    pub resource_group: Option<String>,
    #[serde(default)]
    pub app_id: Option<Uuid>,
    #[serde(default)]
    pub diagnosis: Option<DiagnosisFixture>,
    #[serde(default)]
    pub correlations: Vec<CorrelationFinding>,
    /// Trace table name -> records.
    #[serde(default)]
    pub traces: BTreeMap<String, Vec<TraceRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisFixture {
    pub summary: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorFixture {
    pub workspaces: Vec<WorkspaceFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFixture {
    pub name: String,
    pub customer_id: Uuid,
    pub location: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricFixture>,
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricFixture {
    pub unit: String,
    /// Timestamp of the first sample.
    pub start: DateTime<Utc>,
    /// Spacing between samples as an ISO 8601 duration.
    #[serde(default = "one_minute")]
    pub grain: String,
    pub values: Vec<f64>,
}

fn one_minute() -> String {
    "PT1M".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceBusFixture {
    pub namespaces: Vec<NamespaceFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceFixture {
    pub name: String,
    #[serde(default)]
    pub topics: Vec<TopicFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicFixture {
    pub name: String,
    #[serde(default = "active")]
    pub status: String,
    #[serde(default)]
    pub size_in_bytes: i64,
    #[serde(default)]
    pub max_size_in_megabytes: Option<i64>,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFixture {
    pub subscription_name: String,
    #[serde(default = "active")]
    pub status: String,
    #[serde(default)]
    pub active_message_count: i64,
    #[serde(default)]
    pub dead_letter_message_count: i64,
}

fn active() -> String {
    "Active".to_string()
}

/* -------------------------------------------------------------------------- */
/* Backend                                                                    */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Default)]
pub struct FixtureBackend {
    doc: FixtureDocument,
}

impl FixtureBackend {
    pub fn new(doc: FixtureDocument) -> Self {
        Self { doc }
    }

    /// Load a fixture document. `.yaml` / `.yml` parse as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture file: {}", path.display()))?;
        let lower = path.to_string_lossy().to_ascii_lowercase();
        let doc: FixtureDocument = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(&raw).context("failed to parse YAML fixture file")?
        } else {
            serde_json::from_str(&raw).context("failed to parse JSON fixture file")?
        };
        debug!(
            path = %path.display(),
            components = doc.app_insights.components.len(),
            workspaces = doc.monitor.workspaces.len(),
            namespaces = doc.service_bus.namespaces.len(),
            "fixture document loaded"
        );
        Ok(Self::new(doc))
    }

    fn authorize(&self, base: &SubscriptionOptions) -> Result<(), ServiceError> {
        let denied = self
            .doc
            .forbidden_subscriptions
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&base.subscription));
        if denied {
            return Err(ServiceError::Forbidden(format!(
                "subscription '{}'",
                base.subscription
            )));
        }
        Ok(())
    }

    fn component(
        &self,
        resource_name: &str,
        resource_group: Option<&str>,
    ) -> Result<&ComponentFixture, ServiceError> {
        self.doc
            .app_insights
            .components
            .iter()
            .find(|c| {
                c.resource_name.eq_ignore_ascii_case(resource_name)
                    && match (resource_group, c.resource_group.as_deref()) {
                        (Some(want), Some(have)) => want.eq_ignore_ascii_case(have),
                        _ => true,
                    }
            })
            .ok_or_else(|| ServiceError::NotFound(format!("component '{resource_name}'")))
    }

    fn workspace(&self, name: &str) -> Result<&WorkspaceFixture, ServiceError> {
        self.doc
            .monitor
            .workspaces
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(name) || w.customer_id.to_string() == name)
            .ok_or_else(|| ServiceError::NotFound(format!("workspace '{name}'")))
    }

    fn namespace(&self, name: &str) -> Result<&NamespaceFixture, ServiceError> {
        self.doc
            .service_bus
            .namespaces
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ServiceError::NotFound(format!("namespace '{name}'")))
    }

    fn topic(&self, options: &TopicOptions) -> Result<&TopicFixture, ServiceError> {
        let ns = self.namespace(&options.namespace.namespace)?;
        ns.topics
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(&options.topic_name))
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "topic '{}' in namespace '{}'",
                    options.topic_name, ns.name
                ))
            })
    }
}

/* ---- Application Insights ---- */

#[async_trait]
impl AppInsightsService for FixtureBackend {
    async fn diagnose(&self, options: &AppDiagnoseOptions) -> Result<AppDiagnosis, ServiceError> {
        self.authorize(&options.base)?;
        let component =
            self.component(&options.resource_name, options.resource_group.as_deref())?;
        Ok(match &component.diagnosis {
            Some(d) => AppDiagnosis {
                resource_name: component.resource_name.clone(),
                summary: d.summary.clone(),
                findings: d.findings.clone(),
            },
            None => AppDiagnosis {
                resource_name: component.resource_name.clone(),
                summary: format!("No issues detected for symptoms: {}", options.symptoms),
                findings: Vec::new(),
            },
        })
    }

    async fn correlate(
        &self,
        options: &AppCorrelateOptions,
    ) -> Result<Vec<CorrelationFinding>, ServiceError> {
        let components: Vec<&ComponentFixture> = match (&options.app_id, &options.resource_name) {
            (Some(id), _) => {
                let c = self
                    .doc
                    .app_insights
                    .components
                    .iter()
                    .find(|c| c.app_id.as_ref() == Some(id))
                    .ok_or_else(|| ServiceError::NotFound(format!("application '{id}'")))?;
                vec![c]
            }
            (None, Some(name)) => vec![self.component(name, None)?],
            (None, None) => self.doc.app_insights.components.iter().collect(),
        };

        Ok(components
            .into_iter()
            .flat_map(|c| c.correlations.iter())
            .filter(|f| {
                options
                    .data_sets
                    .iter()
                    .any(|ds| ds.eq_ignore_ascii_case(&f.data_set))
            })
            .cloned()
            .collect())
    }

    async fn list_traces(
        &self,
        options: &AppTraceListOptions,
    ) -> Result<Vec<TraceRecord>, ServiceError> {
        self.authorize(&options.base)?;
        let component =
            self.component(&options.resource_name, options.resource_group.as_deref())?;
        let records = component
            .traces
            .iter()
            .find(|(table, _)| table.eq_ignore_ascii_case(&options.table))
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or_default();

        Ok(records
            .iter()
            .filter(|r| options.start_time.is_none_or(|s| r.timestamp >= s))
            .filter(|r| options.end_time.is_none_or(|e| r.timestamp <= e))
            .filter(|r| options.duration_range.is_none_or(|d| d.contains(r.duration_ms)))
            .filter(|r| {
                options
                    .filters
                    .iter()
                    .all(|(k, v)| trace_field(r, k).is_some_and(|have| have == *v))
            })
            .cloned()
            .collect())
    }
}

fn trace_field(record: &TraceRecord, key: &str) -> Option<String> {
    match key {
        "name" => Some(record.name.clone()),
        "operationId" | "operation_id" => Some(record.operation_id.clone()),
        "success" => Some(record.success.to_string()),
        other => record.properties.get(other).cloned(),
    }
}

/* ---- Monitor ---- */

#[async_trait]
impl MonitorService for FixtureBackend {
    async fn list_workspaces(
        &self,
        subscription: &SubscriptionOptions,
    ) -> Result<Vec<WorkspaceInfo>, ServiceError> {
        self.authorize(subscription)?;
        Ok(self
            .doc
            .monitor
            .workspaces
            .iter()
            .map(|w| WorkspaceInfo {
                name: w.name.clone(),
                customer_id: w.customer_id,
                location: w.location.clone(),
            })
            .collect())
    }

    async fn query_metrics(
        &self,
        options: &MetricsQueryOptions,
    ) -> Result<Vec<MetricSeries>, ServiceError> {
        self.authorize(&options.base)?;
        let ws = self.workspace(&options.workspace)?;
        options
            .metric_names
            .iter()
            .map(|name| {
                let m = ws.metrics.get(name).ok_or_else(|| {
                    ServiceError::NotFound(format!("metric '{name}' in workspace '{}'", ws.name))
                })?;
                let grain = parse_interval(&m.grain).ok_or_else(|| {
                    ServiceError::Internal(anyhow!(
                        "fixture metric '{name}' has an invalid grain '{}'",
                        m.grain
                    ))
                })?;
                let samples = m
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| {
                        let offset = grain.checked_mul(i32::try_from(i).ok()?)?;
                        Some((m.start.checked_add_signed(offset)?, *v))
                    });
                Ok(MetricSeries {
                    name: name.clone(),
                    unit: m.unit.clone(),
                    aggregation: options.aggregation.as_str().to_string(),
                    values: aggregate(
                        samples,
                        options.start_time,
                        options.end_time,
                        options.interval,
                        options.aggregation,
                    ),
                })
            })
            .collect()
    }

    async fn query_logs(&self, options: &LogQueryOptions) -> Result<Vec<Value>, ServiceError> {
        self.authorize(&options.base)?;
        let ws = self.workspace(&options.workspace)?;
        let rows = ws.tables.get(&options.table).ok_or_else(|| {
            ServiceError::NotFound(format!("table '{}' in workspace '{}'", options.table, ws.name))
        })?;
        let reference = self.doc.as_of.unwrap_or_else(Utc::now);
        let cutoff =
            TimeDelta::try_hours(options.hours).and_then(|h| reference.checked_sub_signed(h));
        // KQL is not evaluated here; only the time range narrows the table.
        debug!(query = %options.query, ?cutoff, "fixture log query");
        Ok(rows
            .iter()
            .filter(|row| {
                row_time(row).is_none_or(|t| t <= reference && cutoff.is_none_or(|c| t >= c))
            })
            .cloned()
            .collect())
    }
}

fn row_time(row: &Value) -> Option<DateTime<Utc>> {
    let raw = row.get("TimeGenerated")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/* ---- Service Bus ---- */

#[async_trait]
impl ServiceBusService for FixtureBackend {
    async fn list_topics(&self, options: &NamespaceOptions) -> Result<Vec<String>, ServiceError> {
        self.authorize(&options.base)?;
        let ns = self.namespace(&options.namespace)?;
        Ok(ns.topics.iter().map(|t| t.name.clone()).collect())
    }

    async fn topic_details(&self, options: &TopicOptions) -> Result<TopicDetails, ServiceError> {
        self.authorize(&options.namespace.base)?;
        let t = self.topic(options)?;
        Ok(TopicDetails {
            name: t.name.clone(),
            status: t.status.clone(),
            size_in_bytes: t.size_in_bytes,
            subscription_count: t.subscriptions.len(),
            max_size_in_megabytes: t.max_size_in_megabytes,
        })
    }

    async fn list_subscriptions(
        &self,
        options: &TopicOptions,
    ) -> Result<Vec<SubscriptionDetails>, ServiceError> {
        self.authorize(&options.namespace.base)?;
        let t = self.topic(options)?;
        Ok(t.subscriptions
            .iter()
            .map(|s| SubscriptionDetails {
                subscription_name: s.subscription_name.clone(),
                topic_name: t.name.clone(),
                status: s.status.clone(),
                active_message_count: s.active_message_count,
                dead_letter_message_count: s.dead_letter_message_count,
            })
            .collect())
    }
}
