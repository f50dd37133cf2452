use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::payload::PanelType;
use crate::time::parse_backend_timestamp;

pub const NO_DATA: &str = "No data returned from API.";
pub const NO_RESULTS: &str = "No results found.";

/// Response body of `query_range`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryRangeResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<QueryRangeData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryRangeData {
    #[serde(default)]
    pub result: Option<Vec<ResultEntry>>,
}

impl QueryRangeResponse {
    /// The entry for the single query this system sends.
    pub fn first_result(&self) -> Option<&ResultEntry> {
        self.data.as_ref()?.result.as_ref()?.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    #[serde(default)]
    pub query_name: Option<String>,
    #[serde(default)]
    pub series: Option<Vec<Series>>,
    #[serde(default)]
    pub table: Option<Table>,
    #[serde(default)]
    pub list: Option<Vec<ListRow>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Series {
    #[serde(default)]
    pub labels: Option<Map<String, Value>>,
    #[serde(default)]
    pub values: Vec<Point>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub timestamp: i64,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Table {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRow {
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// The shape a result entry carries.
#[derive(Debug, Clone, Copy)]
pub enum ResultShape<'a> {
    Series(&'a [Series]),
    Table(&'a Table),
    List(&'a [ListRow]),
    Unrecognized,
}

impl ResultEntry {
    /// List panels look for `list` first; every other panel prefers
    /// `series`, then `table`.
    pub fn shape(&self, panel: PanelType) -> ResultShape<'_> {
        if panel == PanelType::List
            && let Some(list) = &self.list
        {
            return ResultShape::List(list);
        }
        if let Some(series) = &self.series {
            return ResultShape::Series(series);
        }
        if let Some(table) = &self.table {
            return ResultShape::Table(table);
        }
        if let Some(list) = &self.list {
            return ResultShape::List(list);
        }
        ResultShape::Unrecognized
    }
}

/// Field projection used for `list` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListProjection {
    Logs,
    Traces,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    NoData,
    Empty,
    Lines(Vec<String>),
    MissingColumn(String),
    Unexpected(PanelType),
}

impl Normalized {
    /// Final text; `heading` receives the line count and prefixes non-empty output.
    pub fn into_text(self, heading: impl FnOnce(usize) -> String) -> String {
        match self {
            Self::NoData => NO_DATA.to_string(),
            Self::Empty => NO_RESULTS.to_string(),
            Self::Lines(lines) => format!("{}\n\n{}", heading(lines.len()), lines.join("\n")),
            Self::MissingColumn(column) => {
                format!("Could not find '{column}' column in the result.")
            }
            Self::Unexpected(panel) => {
                format!("Unexpected data structure for panel type '{panel}'.")
            }
        }
    }
}

pub fn normalize(
    entry: Option<&ResultEntry>,
    panel: PanelType,
    projection: ListProjection,
) -> Normalized {
    let Some(entry) = entry else {
        return Normalized::NoData;
    };

    let lines = match entry.shape(panel) {
        ResultShape::Series(series) => render_series(series, panel),
        ResultShape::Table(table) => render_table(table),
        ResultShape::List(rows) => rows
            .iter()
            .map(|row| match projection {
                ListProjection::Logs => render_log_row(row),
                ListProjection::Traces => render_trace_row(row),
            })
            .collect(),
        ResultShape::Unrecognized => return Normalized::Unexpected(panel),
    };

    if lines.is_empty() {
        Normalized::Empty
    } else {
        Normalized::Lines(lines)
    }
}

/// Non-empty values of `column` from a table result, one `- name` line each.
pub fn column_values(entry: Option<&ResultEntry>, column: &str) -> Normalized {
    let Some(table) = entry.and_then(|e| e.table.as_ref()) else {
        return Normalized::NoData;
    };
    if table.rows.is_empty() {
        return Normalized::Empty;
    }
    let Some(idx) = table.headers.iter().position(|h| h == column) else {
        return Normalized::MissingColumn(column.to_string());
    };

    let lines = table
        .rows
        .iter()
        .filter_map(|row| row.get(idx))
        .map(display_value)
        .filter(|v| !v.is_empty())
        .map(|v| format!("- {v}"))
        .collect::<Vec<_>>();
    if lines.is_empty() {
        Normalized::Empty
    } else {
        Normalized::Lines(lines)
    }
}

pub fn render_series(series: &[Series], panel: PanelType) -> Vec<String> {
    let mut out = Vec::new();
    for s in series {
        let labels = s
            .labels
            .as_ref()
            .map(|m| {
                m.iter()
                    .map(|(k, v)| format!("{k}={}", display_value(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        let labels = if labels.is_empty() {
            String::new()
        } else {
            format!("({labels})")
        };

        for point in &s.values {
            let value = display_value(&point.value);
            if panel == PanelType::Value {
                out.push(format!("Value: {value} {labels}").trim().to_string());
            } else {
                out.push(format!(
                    "[{}] {labels} -> Value: {value}",
                    format_millis(point.timestamp)
                ));
            }
        }
    }
    out
}

pub fn render_table(table: &Table) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|row| {
            table
                .headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let cell = row.get(i).map(display_value);
                    format!("{header}: {}", cell.as_deref().unwrap_or("-"))
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect()
}

fn render_log_row(row: &ListRow) -> String {
    let service = row
        .data
        .get("resources_string")
        .and_then(|r| r.get("service.name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let level = row
        .data
        .get("severity_text")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| format!("[{s}]"))
        .unwrap_or_default();
    let body = row.data.get("body").map(display_value).unwrap_or_default();
    format!(
        "[{}] [{service}] {level} {body}",
        format_row_timestamp(&row.timestamp)
    )
}

fn render_trace_row(row: &ListRow) -> String {
    let field = |key: &str| {
        row.data
            .get(key)
            .map(display_value)
            .unwrap_or_else(|| "-".to_string())
    };
    let duration = row
        .data
        .get("durationNano")
        .and_then(|v| v.as_f64().or_else(|| v.as_str()?.parse().ok()))
        .map(format_duration_ms)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "TraceID: {}, SpanID: {}, Service: {}, Name: {}, Duration: {duration}",
        field("traceID"),
        field("spanID"),
        field("serviceName"),
        field("name"),
    )
}

/// Nanoseconds rendered as milliseconds with two decimals.
pub fn format_duration_ms(nanos: f64) -> String {
    format!("{:.2}ms", nanos / 1_000_000.0)
}

fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

fn format_row_timestamp(value: &Value) -> String {
    parse_backend_timestamp(value)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| display_value(value))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry(value: Value) -> ResultEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn table_rows_render_header_value_pairs() {
        let e = entry(json!({"table": {"headers": ["serviceName", "count"], "rows": [["checkout", "42"]]}}));
        let ResultShape::Table(table) = e.shape(PanelType::Table) else {
            panic!("expected table");
        };
        assert_eq!(render_table(table), vec!["serviceName: checkout, count: 42"]);
    }

    #[test]
    fn graph_point_without_labels() {
        let e = entry(json!({"series": [{"labels": {}, "values": [{"timestamp": 1_700_000_000_000_i64, "value": "5"}]}]}));
        assert_eq!(
            normalize(Some(&e), PanelType::Graph, ListProjection::Logs),
            Normalized::Lines(vec!["[2023-11-14T22:13:20.000Z]  -> Value: 5".to_string()])
        );
    }

    #[test]
    fn series_labels_and_value_panel() {
        let e = entry(json!({"series": [{
            "labels": {"service.name": "checkout", "severity_text": "ERROR"},
            "values": [{"timestamp": 0, "value": "12"}]
        }]}));
        assert_eq!(
            render_series(e.series.as_deref().unwrap(), PanelType::Graph),
            vec!["[1970-01-01T00:00:00.000Z] (service.name=checkout, severity_text=ERROR) -> Value: 12"]
        );
        assert_eq!(
            render_series(e.series.as_deref().unwrap(), PanelType::Value),
            vec!["Value: 12 (service.name=checkout, severity_text=ERROR)"]
        );

        let bare = entry(json!({"series": [{"values": [{"timestamp": 0, "value": 3.5}]}]}));
        assert_eq!(
            render_series(bare.series.as_deref().unwrap(), PanelType::Value),
            vec!["Value: 3.5"]
        );
    }

    #[test]
    fn absent_and_empty_results() {
        assert_eq!(
            normalize(None, PanelType::Graph, ListProjection::Logs),
            Normalized::NoData
        );
        for body in [
            json!({"series": []}),
            json!({"table": {"headers": ["a"], "rows": []}}),
            json!({"list": []}),
        ] {
            let e = entry(body);
            for panel in [PanelType::Graph, PanelType::Table, PanelType::List] {
                assert_eq!(
                    normalize(Some(&e), panel, ListProjection::Traces),
                    Normalized::Empty
                );
            }
        }
        assert_eq!(Normalized::NoData.into_text(|_| unreachable!()), NO_DATA);
        assert_eq!(Normalized::Empty.into_text(|_| unreachable!()), NO_RESULTS);
    }

    #[test]
    fn unrecognized_shape() {
        let e = entry(json!({"queryName": "A"}));
        let text = normalize(Some(&e), PanelType::Value, ListProjection::Logs)
            .into_text(|_| String::new());
        assert_eq!(text, "Unexpected data structure for panel type 'value'.");
    }

    #[test]
    fn response_first_result_handles_missing_layers() {
        let r: QueryRangeResponse = serde_json::from_value(json!({"status": "success"})).unwrap();
        assert!(r.first_result().is_none());
        let r: QueryRangeResponse =
            serde_json::from_value(json!({"data": {"result": null}})).unwrap();
        assert!(r.first_result().is_none());
        let r: QueryRangeResponse =
            serde_json::from_value(json!({"data": {"result": [{"queryName": "A", "list": []}]}}))
                .unwrap();
        assert_eq!(
            r.first_result().and_then(|e| e.query_name.as_deref()),
            Some("A")
        );
    }

    #[test]
    fn log_rows_project_service_and_severity() {
        let e = entry(json!({"list": [
            {"timestamp": "2024-05-01T10:00:00.123456789Z", "data": {
                "body": "payment declined",
                "severity_text": "WARN",
                "resources_string": {"service.name": "payments"}
            }},
            {"timestamp": "2024-05-01T10:00:01Z", "data": {"body": "no metadata"}}
        ]}));
        let out = normalize(Some(&e), PanelType::List, ListProjection::Logs).into_text(|n| format!("Found {n} logs:"));
        assert_eq!(
            out,
            "Found 2 logs:\n\n\
             [2024-05-01T10:00:00.123Z] [payments] [WARN] payment declined\n\
             [2024-05-01T10:00:01.000Z] [unknown]  no metadata"
        );
    }

    #[test]
    fn trace_rows_convert_nanos_to_millis() {
        let e = entry(json!({"list": [{"timestamp": 0, "data": {
            "traceID": "abc", "spanID": "def", "serviceName": "api",
            "name": "GET /orders", "durationNano": 1_500_000
        }}]}));
        assert_eq!(
            normalize(Some(&e), PanelType::List, ListProjection::Traces),
            Normalized::Lines(vec![
                "TraceID: abc, SpanID: def, Service: api, Name: GET /orders, Duration: 1.50ms"
                    .to_string()
            ])
        );
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration_ms(1_500_000.0), "1.50ms");
        assert_eq!(format_duration_ms(0.0), "0.00ms");
        assert_eq!(format_duration_ms(123_456_789.0), "123.46ms");
    }

    #[test]
    fn column_values_lists_services() {
        let e = entry(json!({"table": {
            "headers": ["serviceName", "count"],
            "rows": [["checkout", 4], ["", 1], ["payments", 9]]
        }}));
        assert_eq!(
            column_values(Some(&e), "serviceName"),
            Normalized::Lines(vec!["- checkout".to_string(), "- payments".to_string()])
        );
        assert_eq!(
            column_values(Some(&e), "service.name"),
            Normalized::MissingColumn("service.name".to_string())
        );
        assert_eq!(column_values(None, "serviceName"), Normalized::NoData);
    }
}
