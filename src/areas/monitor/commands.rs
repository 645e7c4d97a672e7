/*!
Monitor commands.

  monitor workspace list  - Log Analytics workspaces in a subscription
  monitor metrics query   - metric series for a workspace and time range
  monitor log query       - KQL query against one workspace table
*/

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use super::MonitorService;
use super::models::{LogQueryCommandResult, MetricsQueryCommandResult, WorkspaceListCommandResult};
use super::series::{Aggregation, parse_interval};
use crate::areas::Area;
use crate::areas::options::{
    END_TIME, START_TIME, SubscriptionOptions, time_range_definitions, with_subscription,
};
use crate::command::options::check_time_range;
use crate::command::{
    Command, CommandContext, CommandError, CommandOptions, OptionDef, OptionKind, ParsedArgs,
    ValidationError,
};

const WORKSPACE: &str = "workspace";
const METRIC_NAMES: &str = "metric-names";
const INTERVAL: &str = "interval";
const AGGREGATION: &str = "aggregation";
const TABLE: &str = "table";
const QUERY: &str = "query";
const HOURS: &str = "hours";
const LIMIT: &str = "limit";

const DEFAULT_HOURS: i64 = 24;

/* -------------------------------------------------------------------------- */
/* workspace list                                                             */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct WorkspaceListOptions {
    pub base: SubscriptionOptions,
}

impl CommandOptions for WorkspaceListOptions {
    fn definitions() -> Vec<OptionDef> {
        SubscriptionOptions::definitions()
    }

    fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError> {
        Ok(Self {
            base: SubscriptionOptions::from_args(args)?,
        })
    }
}

pub struct WorkspaceListCommand {
    service: Arc<dyn MonitorService>,
}

impl WorkspaceListCommand {
    pub fn new(service: Arc<dyn MonitorService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for WorkspaceListCommand {
    type Options = WorkspaceListOptions;
    type Output = WorkspaceListCommandResult;

    const NAME: &'static str = "monitor workspace list";
    const DESCRIPTION: &'static str =
        "List Log Analytics workspaces in a subscription (name, customer id, location).";
    const AREA: Area = Area::Monitor;

    async fn execute(
        &self,
        _ctx: &CommandContext,
        options: WorkspaceListOptions,
    ) -> Result<WorkspaceListCommandResult, CommandError> {
        let workspaces = self.service.list_workspaces(&options.base).await?;
        Ok(WorkspaceListCommandResult { workspaces })
    }
}

/* -------------------------------------------------------------------------- */
/* metrics query                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct MetricsQueryOptions {
    pub base: SubscriptionOptions,
    pub workspace: String,
    pub metric_names: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Bucket width, parsed from an ISO 8601 duration (default one minute).
    pub interval: TimeDelta,
    pub aggregation: Aggregation,
}

impl CommandOptions for MetricsQueryOptions {
    fn definitions() -> Vec<OptionDef> {
        let mut own = vec![
            OptionDef::required(WORKSPACE, OptionKind::String, "Log Analytics workspace name"),
            OptionDef::required(METRIC_NAMES, OptionKind::StringList, "Metric names to query"),
        ];
        own.extend(time_range_definitions(true));
        own.push(OptionDef::optional(
            INTERVAL,
            OptionKind::String,
            "Aggregation interval as an ISO 8601 duration (default PT1M)",
        ));
        own.push(OptionDef::optional(
            AGGREGATION,
            OptionKind::Choice(Aggregation::NAMES),
            "Aggregation applied per interval (default: average)",
        ));
        with_subscription(own)
    }

    fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError> {
        let start_time = args.require_datetime(START_TIME)?;
        let end_time = args.require_datetime(END_TIME)?;
        check_time_range(Some(start_time), Some(end_time))?;

        let interval = match args.string(INTERVAL) {
            Some(raw) => parse_interval(&raw).ok_or_else(|| {
                ValidationError::invalid(INTERVAL, "an ISO 8601 duration such as PT5M")
            })?,
            None => TimeDelta::minutes(1),
        };
        let aggregation = args
            .string(AGGREGATION)
            .and_then(|a| Aggregation::from_name(&a))
            .unwrap_or(Aggregation::Average);

        Ok(Self {
            base: SubscriptionOptions::from_args(args)?,
            workspace: args.require_string(WORKSPACE)?,
            metric_names: args.require_string_list(METRIC_NAMES)?,
            start_time,
            end_time,
            interval,
            aggregation,
        })
    }
}

pub struct MetricsQueryCommand {
    service: Arc<dyn MonitorService>,
}

impl MetricsQueryCommand {
    pub fn new(service: Arc<dyn MonitorService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for MetricsQueryCommand {
    type Options = MetricsQueryOptions;
    type Output = MetricsQueryCommandResult;

    const NAME: &'static str = "monitor metrics query";
    const DESCRIPTION: &'static str = "Query metric time series for a workspace over a time range. \
         Returns one series per metric with its values as a number array.";
    const AREA: Area = Area::Monitor;

    async fn execute(
        &self,
        _ctx: &CommandContext,
        options: MetricsQueryOptions,
    ) -> Result<MetricsQueryCommandResult, CommandError> {
        let metrics = self.service.query_metrics(&options).await?;
        Ok(MetricsQueryCommandResult { metrics })
    }
}

/* -------------------------------------------------------------------------- */
/* log query                                                                  */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct LogQueryOptions {
    pub base: SubscriptionOptions,
    pub workspace: String,
    pub table: String,
    pub query: String,
    pub hours: i64,
    pub limit: Option<usize>,
}

impl CommandOptions for LogQueryOptions {
    fn definitions() -> Vec<OptionDef> {
        with_subscription([
            OptionDef::required(WORKSPACE, OptionKind::String, "Log Analytics workspace name"),
            OptionDef::required(TABLE, OptionKind::String, "Table to query (e.g. AppRequests)"),
            OptionDef::required(QUERY, OptionKind::String, "KQL query"),
            OptionDef::optional(
                HOURS,
                OptionKind::Integer,
                "Hours of history to search (default 24)",
            ),
            OptionDef::optional(LIMIT, OptionKind::Integer, "Maximum rows to return"),
        ])
    }

    fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError> {
        let hours = args.integer(HOURS).unwrap_or(DEFAULT_HOURS);
        if hours <= 0 {
            return Err(ValidationError::invalid(HOURS, "a positive integer"));
        }
        let limit = match args.integer(LIMIT) {
            Some(l) if l <= 0 => return Err(ValidationError::invalid(LIMIT, "a positive integer")),
            Some(l) => Some(l as usize),
            None => None,
        };

        Ok(Self {
            base: SubscriptionOptions::from_args(args)?,
            workspace: args.require_string(WORKSPACE)?,
            table: args.require_string(TABLE)?,
            query: args.require_string(QUERY)?,
            hours,
            limit,
        })
    }
}

pub struct LogQueryCommand {
    service: Arc<dyn MonitorService>,
}

impl LogQueryCommand {
    pub fn new(service: Arc<dyn MonitorService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for LogQueryCommand {
    type Options = LogQueryOptions;
    type Output = LogQueryCommandResult;

    const NAME: &'static str = "monitor log query";
    const DESCRIPTION: &'static str =
        "Run a KQL query against one table of a Log Analytics workspace.";
    const AREA: Area = Area::Monitor;

    async fn execute(
        &self,
        _ctx: &CommandContext,
        options: LogQueryOptions,
    ) -> Result<LogQueryCommandResult, CommandError> {
        let mut rows = self.service.query_logs(&options).await?;
        if let Some(limit) = options.limit {
            rows.truncate(limit);
        }
        Ok(LogQueryCommandResult {
            table: options.table,
            rows,
        })
    }
}
