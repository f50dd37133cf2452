use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use signoz_mcp_core::backend::QueryBackend;
use signoz_mcp_core::error::{Result, SignozError};
use signoz_mcp_core::render::{ListProjection, QueryRangeResponse, column_values, normalize};
use signoz_mcp_core::time::{TimeRange, last_hour, parse_backend_timestamp};

use crate::params::{
    AggregateLogsParams, AggregateTracesParams, SearchLogsParams, SearchTracesParams,
};
use crate::planner::QueryPlanner;
use crate::tool::{ToolKind, ToolResult};

/// Runs tools against a backend. Every tool call ends in a text result;
/// validation and backend failures are reported in that text.
pub struct ToolRunner<B> {
    backend: B,
    planner: QueryPlanner,
}

impl<B: QueryBackend> ToolRunner<B> {
    pub fn new(backend: B) -> Self {
        Self::with_planner(backend, QueryPlanner::default())
    }

    pub fn with_planner(backend: B, planner: QueryPlanner) -> Self {
        Self { backend, planner }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Dispatches by tool name. Errors only for unknown tools or arguments
    /// that do not match the tool's schema.
    #[tracing::instrument(name = "tool_call", skip_all, fields(tool = %name))]
    pub async fn call(&self, name: &str, args: Value) -> Result<ToolResult> {
        let tool: ToolKind = name.parse()?;
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        tracing::info!("tool call");

        Ok(match tool {
            ToolKind::SearchLogs => self.search_logs(&parse_args(args)?).await,
            ToolKind::AggregateLogs => self.aggregate_logs(&parse_args(args)?).await,
            ToolKind::SearchTraces => self.search_traces(&parse_args(args)?).await,
            ToolKind::AggregateTraces => self.aggregate_traces(&parse_args(args)?).await,
            ToolKind::ListServices => self.list_services().await,
        })
    }

    pub async fn search_logs(&self, p: &SearchLogsParams) -> ToolResult {
        let payload = match self.planner.search_logs(p, Utc::now()) {
            Ok(payload) => payload,
            Err(err) => return invalid(err),
        };
        match self.backend.query_range(&payload).await {
            Ok(resp) => ToolResult::text(
                normalize(resp.first_result(), payload.panel_type(), ListProjection::Logs)
                    .into_text(|n| format!("Found {n} logs:")),
            ),
            Err(err) => failure("searching logs", err),
        }
    }

    pub async fn search_traces(&self, p: &SearchTracesParams) -> ToolResult {
        let payload = match self.planner.search_traces(p, Utc::now()) {
            Ok(payload) => payload,
            Err(err) => return invalid(err),
        };
        match self.backend.query_range(&payload).await {
            Ok(resp) => ToolResult::text(
                normalize(
                    resp.first_result(),
                    payload.panel_type(),
                    ListProjection::Traces,
                )
                .into_text(|n| format!("Found {n} traces:")),
            ),
            Err(err) => failure("searching traces", err),
        }
    }

    pub async fn aggregate_logs(&self, p: &AggregateLogsParams) -> ToolResult {
        // A rejected call never reaches the backend, not even for the probe.
        if let Err(err) = self.planner.validate_aggregate_logs(p) {
            return invalid(err);
        }
        let payload = match self
            .log_window(p, Utc::now())
            .await
            .and_then(|range| self.planner.aggregate_logs(p, range))
        {
            Ok(payload) => payload,
            Err(err) => return invalid(err),
        };

        let panel = payload.panel_type();
        match self.backend.query_range(&payload).await {
            Ok(resp) => ToolResult::text(
                normalize(resp.first_result(), panel, ListProjection::Logs)
                    .into_text(|_| format!("Aggregated logs ({panel}):")),
            ),
            Err(err) => failure("aggregating logs", err),
        }
    }

    pub async fn aggregate_traces(&self, p: &AggregateTracesParams) -> ToolResult {
        let payload = match self.planner.aggregate_traces(p, Utc::now()) {
            Ok(payload) => payload,
            Err(err) => return invalid(err),
        };

        let panel = payload.panel_type();
        match self.backend.query_range(&payload).await {
            Ok(resp) => ToolResult::text(
                normalize(resp.first_result(), panel, ListProjection::Traces)
                    .into_text(|_| format!("Aggregated traces ({panel}):")),
            ),
            Err(err) => failure("aggregating traces", err),
        }
    }

    pub async fn list_services(&self) -> ToolResult {
        let payload = self.planner.list_services(Utc::now());
        match self.backend.query_range(&payload).await {
            Ok(resp) => ToolResult::text(
                column_values(resp.first_result(), "serviceName")
                    .into_text(|_| "Found the following services:".to_string()),
            ),
            Err(err) => failure("fetching services", err),
        }
    }

    /// Caller bounds when both are given; otherwise the hour before the most
    /// recent log, falling back to the last hour. Probe failures are logged
    /// and never surface in the tool result.
    async fn log_window(&self, p: &AggregateLogsParams, now: DateTime<Utc>) -> Result<TimeRange> {
        if let (Some(start), Some(end)) = (p.start_time_unix, p.end_time_unix) {
            return TimeRange::from_unix_secs(start, end);
        }
        Ok(self.detect_log_window(now).await)
    }

    #[tracing::instrument(name = "detect_log_window", skip_all)]
    async fn detect_log_window(&self, now: DateTime<Utc>) -> TimeRange {
        tracing::info!("no time range provided, detecting latest log time");
        let probe = self.planner.latest_log_probe(now);
        match self.backend.query_range(&probe).await {
            Ok(resp) => match latest_log_millis(&resp) {
                Some(latest) => {
                    let range = TimeRange::hour_ending_at(latest);
                    tracing::info!(
                        start_ms = range.start_ms,
                        end_ms = range.end_ms,
                        "auto-detected log time range"
                    );
                    range
                }
                None => {
                    tracing::info!("no readable log timestamp, using last hour");
                    last_hour(now)
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to auto-detect log time range, using last hour");
                last_hour(now)
            }
        }
    }
}

fn latest_log_millis(resp: &QueryRangeResponse) -> Option<i64> {
    let row = resp.first_result()?.list.as_ref()?.first()?;
    parse_backend_timestamp(&row.timestamp).map(|ts| ts.timestamp_millis())
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| SignozError::InvalidArgument(format!("invalid tool arguments: {e}")))
}

fn invalid(err: SignozError) -> ToolResult {
    match err {
        SignozError::InvalidArgument(msg) => ToolResult::text(format!("Error: {msg}")),
        other => ToolResult::text(format!("Error: {other}")),
    }
}

fn failure(action: &str, err: SignozError) -> ToolResult {
    ToolResult::text(format!("Error {action}: {err}"))
}
