use std::num::NonZeroU32;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use signoz_mcp_core::payload::PanelType;
use signoz_mcp_core::query::AggregateOperator;

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(20).unwrap();
pub const DEFAULT_LIMIT: NonZeroU32 = NonZeroU32::new(1000).unwrap();
pub const DEFAULT_STEP_INTERVAL: NonZeroU32 = NonZeroU32::new(60).unwrap();

fn default_page_size() -> NonZeroU32 {
    DEFAULT_PAGE_SIZE
}

fn default_limit() -> NonZeroU32 {
    DEFAULT_LIMIT
}

fn default_step_interval() -> NonZeroU32 {
    DEFAULT_STEP_INTERVAL
}

/// The calculation to perform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AggregationFunction {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
    P50,
    P90,
    P99,
    Rate,
}

impl AggregationFunction {
    pub fn operator(self) -> AggregateOperator {
        match self {
            Self::Count => AggregateOperator::Count,
            Self::CountDistinct => AggregateOperator::CountDistinct,
            Self::Sum => AggregateOperator::Sum,
            Self::Avg => AggregateOperator::Avg,
            Self::Min => AggregateOperator::Min,
            Self::Max => AggregateOperator::Max,
            Self::P50 => AggregateOperator::P50,
            Self::P90 => AggregateOperator::P90,
            Self::P99 => AggregateOperator::P99,
            Self::Rate => AggregateOperator::Rate,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.operator().as_str()
    }

    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase())).ok()
    }
}

/// Output format for log aggregation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AggregatePanel {
    Table,
    Graph,
    Value,
}

impl AggregatePanel {
    pub fn panel_type(self) -> PanelType {
        match self {
            Self::Table => PanelType::Table,
            Self::Graph => PanelType::Graph,
            Self::Value => PanelType::Value,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase())).ok()
    }
}

/// Fetches raw log entries.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchLogsParams {
    /// Keywords to search for in the log body.
    #[serde(default)]
    pub query: Option<String>,
    /// Start of time range in Unix seconds. Defaults to 30 mins ago.
    #[serde(default)]
    pub start_time_unix: Option<i64>,
    /// End of time range in Unix seconds. Defaults to now.
    #[serde(default)]
    pub end_time_unix: Option<i64>,
    /// Number of logs to return.
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroU32,
    /// Total pagination limit.
    #[serde(default = "default_limit")]
    pub limit: NonZeroU32,
    /// Filter by a specific service name.
    #[serde(default)]
    pub service_name: Option<String>,
}

impl Default for SearchLogsParams {
    fn default() -> Self {
        Self {
            query: None,
            start_time_unix: None,
            end_time_unix: None,
            page_size: DEFAULT_PAGE_SIZE,
            limit: DEFAULT_LIMIT,
            service_name: None,
        }
    }
}

/// Fetches raw trace spans.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchTracesParams {
    /// Start of time range in Unix seconds. Defaults to 30 mins ago.
    #[serde(default)]
    pub start_time_unix: Option<i64>,
    /// End of time range in Unix seconds. Defaults to now.
    #[serde(default)]
    pub end_time_unix: Option<i64>,
    /// Number of traces to return.
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroU32,
    /// Total pagination limit.
    #[serde(default = "default_limit")]
    pub limit: NonZeroU32,
    /// Filter by a specific service name.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Filter for traces that have an error.
    #[serde(default)]
    pub has_error: Option<bool>,
}

impl Default for SearchTracesParams {
    fn default() -> Self {
        Self {
            start_time_unix: None,
            end_time_unix: None,
            page_size: DEFAULT_PAGE_SIZE,
            limit: DEFAULT_LIMIT,
            service_name: None,
            has_error: None,
        }
    }
}

/// Aggregates log data into a table, a time series, or a single value.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateLogsParams {
    pub aggregation_function: AggregationFunction,
    /// Use 'table' for categorical breakdowns (with `groupBy`), 'graph' for
    /// time-series data (with `stepInterval`), or 'value' for a single number.
    pub panel_type: AggregatePanel,
    /// Start of time range in Unix seconds. When either bound is missing the
    /// hour before the most recent log is used.
    #[serde(default)]
    pub start_time_unix: Option<i64>,
    /// End of time range in Unix seconds.
    #[serde(default)]
    pub end_time_unix: Option<i64>,
    /// Fields to group by, e.g. ['service.name'] for a count per service.
    #[serde(default)]
    pub group_by: Option<Vec<String>>,
    /// The numeric field to aggregate (required for everything except count).
    #[serde(default)]
    pub aggregate_field: Option<String>,
    /// Filter logs to a specific service before aggregating.
    #[serde(default)]
    pub service_name: Option<String>,
    /// For 'graph' and 'value' panels, the time bucket size in seconds.
    #[serde(default = "default_step_interval")]
    pub step_interval: NonZeroU32,
}

impl AggregateLogsParams {
    pub fn new(aggregation_function: AggregationFunction, panel_type: AggregatePanel) -> Self {
        Self {
            aggregation_function,
            panel_type,
            start_time_unix: None,
            end_time_unix: None,
            group_by: None,
            aggregate_field: None,
            service_name: None,
            step_interval: DEFAULT_STEP_INTERVAL,
        }
    }
}

/// Aggregates trace data into a table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateTracesParams {
    pub aggregation_function: AggregationFunction,
    /// Start of time range in Unix seconds. Defaults to 1 hour ago.
    #[serde(default)]
    pub start_time_unix: Option<i64>,
    /// End of time range in Unix seconds. Defaults to now.
    #[serde(default)]
    pub end_time_unix: Option<i64>,
    /// Fields to group by, e.g. ['serviceName'] for a count per service.
    #[serde(default)]
    pub group_by: Option<Vec<String>>,
    /// The numeric field to aggregate, e.g. 'durationNano'. Required for
    /// everything except count.
    #[serde(default)]
    pub aggregate_field: Option<String>,
    /// Filter traces to a specific service before aggregating.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Filter traces that have an error.
    #[serde(default)]
    pub has_error: Option<bool>,
}

impl AggregateTracesParams {
    pub fn new(aggregation_function: AggregationFunction) -> Self {
        Self {
            aggregation_function,
            start_time_unix: None,
            end_time_unix: None,
            group_by: None,
            aggregate_field: None,
            service_name: None,
            has_error: None,
        }
    }
}

/// list-services takes no arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ListServicesParams {}

/// Treats blank strings like absent ones.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
