/*!
Application Insights commands.

  appinsights app diagnose   - summarize likely causes for reported symptoms
  appinsights app correlate  - correlate telemetry data sets with each other
  appinsights trace list     - list distributed traces from one telemetry table

`app correlate` is the only command here without a subscription: data sets
identify the telemetry on their own, `--app-id` / `--resource-name` narrow it.
*/

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::AppInsightsService;
use super::models::{
    AppCorrelateCommandResult, AppDiagnoseCommandResult, AppTraceListCommandResult,
};
use crate::areas::Area;
use crate::areas::options::{
    END_TIME, RESOURCE_GROUP, START_TIME, SubscriptionOptions, time_range_definitions,
    with_subscription,
};
use crate::command::options::check_time_range;
use crate::command::{
    Command, CommandContext, CommandError, CommandOptions, OptionDef, OptionKind, ParsedArgs,
    ValidationError,
};

const RESOURCE_NAME: &str = "resource-name";
const SYMPTOMS: &str = "symptoms";
const DATA_SETS: &str = "data-sets";
const APP_ID: &str = "app-id";
const TABLE: &str = "table";
const FILTERS: &str = "filters";
const DURATION_RANGE: &str = "duration-range";

pub const TRACE_TABLES: &[&str] = &[
    "requests",
    "dependencies",
    "exceptions",
    "availabilityResults",
];

fn component_defs() -> [OptionDef; 2] {
    [
        OptionDef::optional(
            RESOURCE_GROUP,
            OptionKind::String,
            "Resource group of the component",
        ),
        OptionDef::required(
            RESOURCE_NAME,
            OptionKind::String,
            "Application Insights component name",
        ),
    ]
}

/* -------------------------------------------------------------------------- */
/* app diagnose                                                               */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct AppDiagnoseOptions {
    pub base: SubscriptionOptions,
    pub resource_group: Option<String>,
    pub resource_name: String,
    pub symptoms: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl CommandOptions for AppDiagnoseOptions {
    fn definitions() -> Vec<OptionDef> {
        let mut own = component_defs().to_vec();
        own.push(OptionDef::required(
            SYMPTOMS,
            OptionKind::String,
            "Free-text description of the observed problem",
        ));
        own.extend(time_range_definitions(false));
        with_subscription(own)
    }

    fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError> {
        let start_time = args.datetime(START_TIME);
        let end_time = args.datetime(END_TIME);
        check_time_range(start_time, end_time)?;
        Ok(Self {
            base: SubscriptionOptions::from_args(args)?,
            resource_group: args.string(RESOURCE_GROUP),
            resource_name: args.require_string(RESOURCE_NAME)?,
            symptoms: args.require_string(SYMPTOMS)?,
            start_time,
            end_time,
        })
    }
}

pub struct AppDiagnoseCommand {
    service: Arc<dyn AppInsightsService>,
}

impl AppDiagnoseCommand {
    pub fn new(service: Arc<dyn AppInsightsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for AppDiagnoseCommand {
    type Options = AppDiagnoseOptions;
    type Output = AppDiagnoseCommandResult;

    const NAME: &'static str = "appinsights app diagnose";
    const DESCRIPTION: &'static str = "Diagnose an Application Insights component from a symptom \
         description. Returns a summary and categorized findings.";
    const AREA: Area = Area::AppInsights;

    fn success_message(&self) -> &'static str {
        "Diagnosis completed"
    }

    async fn execute(
        &self,
        _ctx: &CommandContext,
        options: AppDiagnoseOptions,
    ) -> Result<AppDiagnoseCommandResult, CommandError> {
        let diagnosis = self.service.diagnose(&options).await?;
        Ok(AppDiagnoseCommandResult { diagnosis })
    }
}

/* -------------------------------------------------------------------------- */
/* app correlate                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct AppCorrelateOptions {
    pub data_sets: Vec<String>,
    pub app_id: Option<Uuid>,
    pub resource_name: Option<String>,
    pub symptoms: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl CommandOptions for AppCorrelateOptions {
    fn definitions() -> Vec<OptionDef> {
        let mut defs = vec![
            OptionDef::required(
                DATA_SETS,
                OptionKind::StringList,
                "Telemetry data sets to correlate (e.g. requests, dependencies, exceptions)",
            ),
            OptionDef::optional(APP_ID, OptionKind::Guid, "Application Insights application id"),
            OptionDef::optional(
                RESOURCE_NAME,
                OptionKind::String,
                "Application Insights component name",
            ),
            OptionDef::optional(
                SYMPTOMS,
                OptionKind::String,
                "Free-text description of the observed problem",
            ),
        ];
        defs.extend(time_range_definitions(false));
        defs
    }

    fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError> {
        let start_time = args.datetime(START_TIME);
        let end_time = args.datetime(END_TIME);
        check_time_range(start_time, end_time)?;
        Ok(Self {
            data_sets: args.require_string_list(DATA_SETS)?,
            app_id: args.guid(APP_ID),
            resource_name: args.string(RESOURCE_NAME),
            symptoms: args.string(SYMPTOMS),
            start_time,
            end_time,
        })
    }
}

pub struct AppCorrelateCommand {
    service: Arc<dyn AppInsightsService>,
}

impl AppCorrelateCommand {
    pub fn new(service: Arc<dyn AppInsightsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for AppCorrelateCommand {
    type Options = AppCorrelateOptions;
    type Output = AppCorrelateCommandResult;

    const NAME: &'static str = "appinsights app correlate";
    const DESCRIPTION: &'static str = "Correlate Application Insights telemetry data sets \
         (requests, dependencies, exceptions, ...) and report related movements.";
    const AREA: Area = Area::AppInsights;

    async fn execute(
        &self,
        _ctx: &CommandContext,
        options: AppCorrelateOptions,
    ) -> Result<AppCorrelateCommandResult, CommandError> {
        let mut correlations = self.service.correlate(&options).await?;
        correlations.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(AppCorrelateCommandResult { correlations })
    }
}

/* -------------------------------------------------------------------------- */
/* trace list                                                                 */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct AppTraceListOptions {
    pub base: SubscriptionOptions,
    pub resource_group: Option<String>,
    pub resource_name: String,
    pub table: String,
    /// `KEY=VALUE` pairs matched against trace name / properties.
    pub filters: Vec<(String, String)>,
    pub duration_range: Option<DurationRange>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Inclusive bounds on a trace's duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationRange {
    pub min_ms: f64,
    pub max_ms: Option<f64>,
}

impl DurationRange {
    pub fn contains(&self, duration_ms: f64) -> bool {
        duration_ms >= self.min_ms && self.max_ms.is_none_or(|max| duration_ms <= max)
    }
}

impl CommandOptions for AppTraceListOptions {
    fn definitions() -> Vec<OptionDef> {
        let mut own = component_defs().to_vec();
        own.extend([
            OptionDef::required(TABLE, OptionKind::Choice(TRACE_TABLES), "Telemetry table to read"),
            OptionDef::optional(FILTERS, OptionKind::StringList, "Filters as KEY=VALUE pairs"),
            OptionDef::optional(
                DURATION_RANGE,
                OptionKind::NumberList,
                "Trace duration bounds in milliseconds as MIN or MIN,MAX",
            ),
        ]);
        own.extend(time_range_definitions(false));
        with_subscription(own)
    }

    fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError> {
        let start_time = args.datetime(START_TIME);
        let end_time = args.datetime(END_TIME);
        check_time_range(start_time, end_time)?;
        let filters = parse_filters(&args.string_list(FILTERS).unwrap_or_default())?;
        let duration_range = args
            .number_list(DURATION_RANGE)
            .map(|bounds| parse_duration_range(&bounds))
            .transpose()?;
        Ok(Self {
            base: SubscriptionOptions::from_args(args)?,
            resource_group: args.string(RESOURCE_GROUP),
            resource_name: args.require_string(RESOURCE_NAME)?,
            table: args.require_string(TABLE)?,
            filters,
            duration_range,
            start_time,
            end_time,
        })
    }
}

fn parse_filters(raw: &[String]) -> Result<Vec<(String, String)>, ValidationError> {
    raw.iter()
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => {
                Ok((k.trim().to_string(), v.trim().to_string()))
            }
            _ => Err(ValidationError::invalid(FILTERS, "KEY=VALUE pairs")),
        })
        .collect()
}

fn parse_duration_range(bounds: &[f64]) -> Result<DurationRange, ValidationError> {
    match *bounds {
        [min] if min >= 0.0 => Ok(DurationRange {
            min_ms: min,
            max_ms: None,
        }),
        [min, max] if min >= 0.0 && min <= max => Ok(DurationRange {
            min_ms: min,
            max_ms: Some(max),
        }),
        _ => Err(ValidationError::invalid(
            DURATION_RANGE,
            "MIN or MIN,MAX milliseconds with 0 <= MIN <= MAX",
        )),
    }
}

pub struct AppTraceListCommand {
    service: Arc<dyn AppInsightsService>,
}

impl AppTraceListCommand {
    pub fn new(service: Arc<dyn AppInsightsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for AppTraceListCommand {
    type Options = AppTraceListOptions;
    type Output = AppTraceListCommandResult;

    const NAME: &'static str = "appinsights trace list";
    const DESCRIPTION: &'static str = "List distributed traces from an Application Insights \
         telemetry table, optionally filtered by KEY=VALUE pairs, duration and time range.";
    const AREA: Area = Area::AppInsights;

    async fn execute(
        &self,
        _ctx: &CommandContext,
        options: AppTraceListOptions,
    ) -> Result<AppTraceListCommandResult, CommandError> {
        let mut traces = self.service.list_traces(&options).await?;
        traces.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(AppTraceListCommandResult {
            table: options.table,
            traces,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::appinsights::models::{
        AppDiagnosis, CorrelationFinding, Finding, TraceRecord,
    };
    use crate::areas::appinsights::{DECLARED, manifest, register};
    use crate::command::{CommandRegistry, RawArgs, ServiceError, ServiceLocator};
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubInsights {
        seen_filters: Mutex<Vec<(String, String)>>,
        seen_range: Mutex<Option<DurationRange>>,
    }

    #[async_trait]
    impl AppInsightsService for StubInsights {
        async fn diagnose(
            &self,
            options: &AppDiagnoseOptions,
        ) -> Result<AppDiagnosis, ServiceError> {
            if options.resource_name == "broken" {
                return Err(ServiceError::Internal(anyhow::anyhow!(
                    "HTTP 500 from https://api.applicationinsights.io: stack trace ..."
                )));
            }
            Ok(AppDiagnosis {
                resource_name: options.resource_name.clone(),
                summary: format!("symptoms: {}", options.symptoms),
                findings: vec![Finding {
                    category: "dependency".into(),
                    severity: "high".into(),
                    description: "SQL latency spike".into(),
                }],
            })
        }

        async fn correlate(
            &self,
            options: &AppCorrelateOptions,
        ) -> Result<Vec<CorrelationFinding>, ServiceError> {
            Ok(options
                .data_sets
                .iter()
                .enumerate()
                .map(|(i, d)| CorrelationFinding {
                    data_set: d.clone(),
                    related_data_set: "exceptions".into(),
                    score: 0.1 * (i as f64 + 1.0),
                    summary: String::new(),
                })
                .collect())
        }

        async fn list_traces(
            &self,
            options: &AppTraceListOptions,
        ) -> Result<Vec<TraceRecord>, ServiceError> {
            *self.seen_filters.lock().unwrap() = options.filters.clone();
            *self.seen_range.lock().unwrap() = options.duration_range;
            let at = |s: &str| s.parse::<DateTime<Utc>>().unwrap();
            Ok(vec![
                TraceRecord {
                    operation_id: "op-1".into(),
                    name: "GET /cart".into(),
                    timestamp: at("2024-05-01T10:00:00Z"),
                    duration_ms: 120.0,
                    success: true,
                    properties: BTreeMap::new(),
                },
                TraceRecord {
                    operation_id: "op-2".into(),
                    name: "POST /checkout".into(),
                    timestamp: at("2024-05-01T11:00:00Z"),
                    duration_ms: 3400.5,
                    success: false,
                    properties: BTreeMap::new(),
                },
            ])
        }
    }

    fn registry() -> (CommandRegistry, Arc<StubInsights>) {
        let stub = Arc::new(StubInsights::default());
        let mut locator = ServiceLocator::new();
        locator.provide::<dyn AppInsightsService>(stub.clone());
        let mut builder = CommandRegistry::builder(Arc::new(locator));
        register(&mut builder).unwrap();
        (builder.build(), stub)
    }

    fn raw(v: Value) -> RawArgs {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn correlate_without_arguments() {
        let (reg, _) = registry();
        let resp = reg
            .dispatch("appinsights app correlate", &RawArgs::new(), reg.new_context())
            .await;
        assert_eq!(resp.status, 400);
        assert_eq!(resp.message, "Missing Required options: --data-sets");
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"status": 400, "message": "Missing Required options: --data-sets"})
        );
    }

    #[tokio::test]
    async fn correlate_rejects_malformed_app_id() {
        let (reg, _) = registry();
        let resp = reg
            .dispatch(
                "appinsights app correlate",
                &raw(json!({"data-sets": ["requests"], "app-id": "1234"})),
                reg.new_context(),
            )
            .await;
        assert_eq!(resp.status, 400);
        assert_eq!(resp.message, "Invalid value for --app-id: expected a GUID");
    }

    #[tokio::test]
    async fn correlate_orders_by_score() {
        let (reg, _) = registry();
        let resp = reg
            .dispatch(
                "appinsights app correlate",
                &raw(json!({"data-sets": "requests,dependencies"})),
                reg.new_context(),
            )
            .await;
        assert_eq!(resp.status, 200);
        let result = resp.result.unwrap();
        assert_eq!(result["correlations"][0]["dataSet"], json!("dependencies"));
        assert_eq!(
            result["correlations"][1]["relatedDataSet"],
            json!("exceptions")
        );
    }

    #[tokio::test]
    async fn diagnose_uses_its_success_message() {
        let (reg, _) = registry();
        let resp = reg
            .dispatch(
                "appinsights app diagnose",
                &raw(json!({
                    "subscription": "sub",
                    "resource-name": "checkout-ai",
                    "symptoms": "slow checkout"
                })),
                reg.new_context(),
            )
            .await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.message, "Diagnosis completed");
        let result = resp.result.unwrap();
        assert_eq!(result["diagnosis"]["resourceName"], json!("checkout-ai"));
        assert_eq!(result["diagnosis"]["findings"][0]["severity"], json!("high"));
    }

    #[tokio::test]
    async fn diagnose_hides_internal_failure() {
        let (reg, _) = registry();
        let resp = reg
            .dispatch(
                "appinsights app diagnose",
                &raw(json!({
                    "subscription": "sub",
                    "resource-name": "broken",
                    "symptoms": "errors"
                })),
                reg.new_context(),
            )
            .await;
        assert_eq!(resp.status, 500);
        assert!(!resp.message.contains("applicationinsights.io"));
        assert!(!resp.message.contains("stack trace"));
    }

    #[tokio::test]
    async fn trace_list_newest_first_with_filters() {
        let (reg, stub) = registry();
        let resp = reg
            .dispatch(
                "appinsights trace list",
                &raw(json!({
                    "subscription": "sub",
                    "resource-name": "checkout-ai",
                    "table": "Requests",
                    "filters": ["success=false", "cloud_RoleName = api"]
                })),
                reg.new_context(),
            )
            .await;
        assert_eq!(resp.status, 200);
        let result = resp.result.unwrap();
        assert_eq!(result["table"], json!("requests"));
        assert_eq!(result["traces"][0]["operationId"], json!("op-2"));
        assert_eq!(result["traces"][0]["durationMs"], json!(3400.5));
        assert_eq!(
            *stub.seen_filters.lock().unwrap(),
            vec![
                ("success".to_string(), "false".to_string()),
                ("cloud_RoleName".to_string(), "api".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn trace_list_rejects_bad_filter() {
        let (reg, _) = registry();
        let resp = reg
            .dispatch(
                "appinsights trace list",
                &raw(json!({
                    "subscription": "sub",
                    "resource-name": "checkout-ai",
                    "table": "requests",
                    "filters": ["=oops"]
                })),
                reg.new_context(),
            )
            .await;
        assert_eq!(resp.status, 400);
        assert_eq!(
            resp.message,
            "Invalid value for --filters: expected KEY=VALUE pairs"
        );
    }

    #[tokio::test]
    async fn correlate_blank_data_sets_are_missing() {
        let (reg, _) = registry();
        for blank in [json!(","), json!([" "]), json!([])] {
            let resp = reg
                .dispatch(
                    "appinsights app correlate",
                    &raw(json!({"data-sets": blank})),
                    reg.new_context(),
                )
                .await;
            assert_eq!(resp.status, 400, "{blank}");
            assert_eq!(resp.message, "Missing Required options: --data-sets");
        }
    }

    fn trace_args(range: Value) -> RawArgs {
        raw(json!({
            "subscription": "sub",
            "resource-name": "checkout-ai",
            "table": "requests",
            "duration-range": range
        }))
    }

    #[tokio::test]
    async fn trace_list_passes_duration_range() {
        let (reg, stub) = registry();
        let resp = reg
            .dispatch(
                "appinsights trace list",
                &trace_args(json!("100,2500")),
                reg.new_context(),
            )
            .await;
        assert_eq!(resp.status, 200);
        assert_eq!(
            *stub.seen_range.lock().unwrap(),
            Some(DurationRange {
                min_ms: 100.0,
                max_ms: Some(2500.0)
            })
        );

        let resp = reg
            .dispatch(
                "appinsights trace list",
                &trace_args(json!([50])),
                reg.new_context(),
            )
            .await;
        assert_eq!(resp.status, 200);
        let range = stub.seen_range.lock().unwrap().unwrap();
        assert!(range.contains(50.0) && range.contains(1e9));
        assert!(!range.contains(49.9));
    }

    #[tokio::test]
    async fn trace_list_rejects_bad_duration_range() {
        let (reg, _) = registry();
        for bad in [json!([500, 100]), json!([-1]), json!([1, 2, 3])] {
            let resp = reg
                .dispatch(
                    "appinsights trace list",
                    &trace_args(bad.clone()),
                    reg.new_context(),
                )
                .await;
            assert_eq!(resp.status, 400, "{bad}");
            assert_eq!(
                resp.message,
                "Invalid value for --duration-range: \
                 expected MIN or MIN,MAX milliseconds with 0 <= MIN <= MAX"
            );
        }
    }

    #[test]
    fn catalogue_is_complete() {
        let (reg, _) = registry();
        let report = reg.self_check();
        assert!(report.is_clean(), "{report}");
        assert_eq!(report.commands, DECLARED.len());
    }

    #[test]
    fn every_result_type_round_trips() {
        use crate::command::manifest::assert_round_trip;
        use std::collections::BTreeSet;

        let m = manifest();
        let at = "2026-03-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let covered: BTreeSet<&str> = [
            assert_round_trip(
                &m,
                &AppDiagnoseCommandResult {
                    diagnosis: AppDiagnosis {
                        resource_name: "checkout-ai".into(),
                        summary: "dependency latency".into(),
                        findings: vec![Finding {
                            category: "dependency".into(),
                            severity: "high".into(),
                            description: "SQL latency spike".into(),
                        }],
                    },
                },
                json!({"diagnosis": {
                    "resourceName": "checkout-ai",
                    "summary": "dependency latency",
                    "findings": [{
                        "category": "dependency",
                        "severity": "high",
                        "description": "SQL latency spike"
                    }]
                }}),
            ),
            assert_round_trip(
                &m,
                &AppCorrelateCommandResult {
                    correlations: vec![CorrelationFinding {
                        data_set: "requests".into(),
                        related_data_set: "dependencies".into(),
                        score: 0.82,
                        summary: "latency follows dependency failures".into(),
                    }],
                },
                json!({"correlations": [{
                    "dataSet": "requests",
                    "relatedDataSet": "dependencies",
                    "score": 0.82,
                    "summary": "latency follows dependency failures"
                }]}),
            ),
            assert_round_trip(
                &m,
                &AppTraceListCommandResult {
                    table: "requests".into(),
                    traces: vec![
                        TraceRecord {
                            operation_id: "op-1".into(),
                            name: "GET /cart".into(),
                            timestamp: at,
                            duration_ms: 18.5,
                            success: true,
                            properties: BTreeMap::new(),
                        },
                        TraceRecord {
                            operation_id: "op-2".into(),
                            name: "POST /checkout".into(),
                            timestamp: at,
                            duration_ms: 2140.5,
                            success: false,
                            properties: BTreeMap::from([("cloud_RoleName".into(), "api".into())]),
                        },
                    ],
                },
                json!({"table": "requests", "traces": [
                    {
                        "operationId": "op-1",
                        "name": "GET /cart",
                        "timestamp": "2026-03-01T10:00:00Z",
                        "durationMs": 18.5,
                        "success": true
                    },
                    {
                        "operationId": "op-2",
                        "name": "POST /checkout",
                        "timestamp": "2026-03-01T10:00:00Z",
                        "durationMs": 2140.5,
                        "success": false,
                        "properties": {"cloud_RoleName": "api"}
                    }
                ]}),
            ),
        ]
        .into_iter()
        .collect();

        let (reg, _) = registry();
        let registered: BTreeSet<&str> = reg.commands().map(|c| c.result_type()).collect();
        assert_eq!(covered, registered);
    }
}
