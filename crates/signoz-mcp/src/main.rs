mod mcp;
mod output;
mod telemetry;

use std::num::NonZeroU32;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use signoz_mcp_client::HttpBackend;
use signoz_mcp_core::config::Config;
use signoz_mcp_core::time::parse_cli_time;
use signoz_mcp_tools::params::{DEFAULT_LIMIT, DEFAULT_PAGE_SIZE, DEFAULT_STEP_INTERVAL};
use signoz_mcp_tools::{
    AggregateLogsParams, AggregatePanel, AggregateTracesParams, AggregationFunction,
    SearchLogsParams, SearchTracesParams, ToolRunner,
};

use crate::mcp::McpServer;
use crate::output::print_tool_result;
use crate::telemetry::{init_tracing, shutdown_tracing};

#[derive(Parser, Debug)]
#[command(name = "signoz-mcp")]
#[command(about = "Query SigNoz logs and traces from the shell or over MCP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Print the raw tool result as JSON")]
    json: bool,

    #[arg(long, global = true, help = "Overrides SIGNOZ_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, global = true, help = "Overrides SIGNOZ_API_KEY")]
    api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Serve the tools over MCP on stdio")]
    Mcp,
    #[command(about = "Fetch raw log entries")]
    SearchLogs {
        #[arg(help = "Keywords to search for in the log body")]
        query: Option<String>,
        #[arg(long, help = "RFC3339 time or duration ago (e.g. 15m)")]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: NonZeroU32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: NonZeroU32,
    },
    #[command(about = "Fetch raw trace spans")]
    SearchTraces {
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        has_error: Option<bool>,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: NonZeroU32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: NonZeroU32,
    },
    #[command(about = "Aggregate log data into a table, series or single value")]
    AggregateLogs {
        #[arg(value_parser = parse_function)]
        function: AggregationFunction,
        #[arg(long, default_value = "table", value_parser = parse_panel)]
        panel: AggregatePanel,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        #[arg(long = "group-by")]
        group_by: Vec<String>,
        #[arg(long)]
        field: Option<String>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long, default_value_t = DEFAULT_STEP_INTERVAL)]
        step: NonZeroU32,
    },
    #[command(about = "Aggregate trace data into a table")]
    AggregateTraces {
        #[arg(value_parser = parse_function)]
        function: AggregationFunction,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        #[arg(long = "group-by")]
        group_by: Vec<String>,
        #[arg(long)]
        field: Option<String>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        has_error: Option<bool>,
    },
    #[command(about = "List services that sent traces in the last 24 hours")]
    ListServices,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = load_config(cli.base_url, cli.api_key)?;
    let backend = HttpBackend::from_config(&cfg).context("build SigNoz client")?;
    tracing::info!(url = backend.url(), "using SigNoz backend");
    let runner = ToolRunner::new(backend);

    let result = match cli.command {
        Commands::Mcp => return McpServer::new(runner).serve_stdio().await,
        Commands::SearchLogs {
            query,
            since,
            until,
            service,
            page_size,
            limit,
        } => {
            let (start_time_unix, end_time_unix) = parse_window(since, until)?;
            let params = SearchLogsParams {
                query,
                start_time_unix,
                end_time_unix,
                page_size,
                limit,
                service_name: service,
            };
            runner.search_logs(&params).await
        }
        Commands::SearchTraces {
            since,
            until,
            service,
            has_error,
            page_size,
            limit,
        } => {
            let (start_time_unix, end_time_unix) = parse_window(since, until)?;
            let params = SearchTracesParams {
                start_time_unix,
                end_time_unix,
                page_size,
                limit,
                service_name: service,
                has_error,
            };
            runner.search_traces(&params).await
        }
        Commands::AggregateLogs {
            function,
            panel,
            since,
            until,
            group_by,
            field,
            service,
            step,
        } => {
            let (start_time_unix, end_time_unix) = parse_window(since, until)?;
            let params = AggregateLogsParams {
                start_time_unix,
                end_time_unix,
                group_by: non_empty_list(group_by),
                aggregate_field: field,
                service_name: service,
                step_interval: step,
                ..AggregateLogsParams::new(function, panel)
            };
            runner.aggregate_logs(&params).await
        }
        Commands::AggregateTraces {
            function,
            since,
            until,
            group_by,
            field,
            service,
            has_error,
        } => {
            let (start_time_unix, end_time_unix) = parse_window(since, until)?;
            let params = AggregateTracesParams {
                start_time_unix,
                end_time_unix,
                group_by: non_empty_list(group_by),
                aggregate_field: field,
                service_name: service,
                has_error,
                ..AggregateTracesParams::new(function)
            };
            runner.aggregate_traces(&params).await
        }
        Commands::ListServices => runner.list_services().await,
    };

    print_tool_result(&result, cli.json)
}

fn load_config(base_url: Option<String>, api_key: Option<String>) -> anyhow::Result<Config> {
    let mut cfg = Config::load().context("load configuration")?;
    if let Some(v) = base_url {
        cfg.base_url = Some(v);
    }
    if let Some(v) = api_key {
        cfg.api_key = Some(v);
    }
    cfg.require_credentials()?;
    Ok(cfg)
}

/// `--since`/`--until` as unix seconds.
fn parse_window(
    since: Option<String>,
    until: Option<String>,
) -> anyhow::Result<(Option<i64>, Option<i64>)> {
    let now = Utc::now();
    let since = since
        .map(|v| parse_cli_time(&v, now).map(|ts| ts.timestamp()))
        .transpose()?;
    let until = until
        .map(|v| parse_cli_time(&v, now).map(|ts| ts.timestamp()))
        .transpose()?;
    Ok((since, until))
}

fn non_empty_list(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

fn parse_function(s: &str) -> Result<AggregationFunction, String> {
    AggregationFunction::parse(s).ok_or_else(|| {
        format!(
            "unknown aggregation function '{s}' (expected count, count_distinct, sum, avg, min, max, p50, p90, p99, rate)"
        )
    })
}

fn parse_panel(s: &str) -> Result<AggregatePanel, String> {
    AggregatePanel::parse(s)
        .ok_or_else(|| format!("unknown panel type '{s}' (expected table, graph, value)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_window_accepts_rfc3339_and_relative() {
        let (since, until) = parse_window(
            Some("2023-11-14T22:13:20Z".into()),
            Some("2023-11-14T22:23:20Z".into()),
        )
        .unwrap();
        assert_eq!(since, Some(1_700_000_000));
        assert_eq!(until, Some(1_700_000_600));

        let (since, until) = parse_window(Some("15m".into()), None).unwrap();
        assert!(since.is_some());
        assert!(until.is_none());

        assert!(parse_window(Some("yesterday-ish".into()), None).is_err());
    }

    #[test]
    fn function_and_panel_parsers() {
        assert_eq!(parse_function("p90").unwrap(), AggregationFunction::P90);
        assert!(parse_function("p95").unwrap_err().contains("unknown aggregation function"));
        assert_eq!(parse_panel("graph").unwrap(), AggregatePanel::Graph);
        assert!(parse_panel("list").is_err());
    }

    #[test]
    fn cli_parses_aggregate_logs() {
        let cli = Cli::try_parse_from([
            "signoz-mcp",
            "aggregate-logs",
            "count",
            "--panel",
            "graph",
            "--group-by",
            "service.name",
            "--step",
            "300",
        ])
        .unwrap();
        match cli.command {
            Commands::AggregateLogs {
                function,
                panel,
                group_by,
                step,
                ..
            } => {
                assert_eq!(function, AggregationFunction::Count);
                assert_eq!(panel, AggregatePanel::Graph);
                assert_eq!(group_by, vec!["service.name".to_string()]);
                assert_eq!(step.get(), 300);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["signoz-mcp", "search-logs", "--page-size", "0"]).is_err());
    }

    #[test]
    fn empty_group_by_is_absent() {
        assert_eq!(non_empty_list(Vec::new()), None);
        assert_eq!(non_empty_list(vec!["a".into()]), Some(vec!["a".into()]));
    }
}
