use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use signoz_mcp_core::error::SignozError;

use crate::params::{
    AggregateLogsParams, AggregateTracesParams, ListServicesParams, SearchLogsParams,
    SearchTracesParams,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    SearchLogs,
    AggregateLogs,
    SearchTraces,
    AggregateTraces,
    ListServices,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::SearchLogs,
        ToolKind::AggregateLogs,
        ToolKind::SearchTraces,
        ToolKind::AggregateTraces,
        ToolKind::ListServices,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SearchLogs => "search-logs",
            Self::AggregateLogs => "aggregate-logs",
            Self::SearchTraces => "search-traces",
            Self::AggregateTraces => "aggregate-traces",
            Self::ListServices => "list-services",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::SearchLogs => {
                "Fetches a list of raw log entries. Use this when you need to see specific log examples, not for summarized data or charts."
            }
            Self::AggregateLogs => {
                "Calculates aggregate metrics from log data, such as counts or averages. This is the primary tool for generating data for charts and tables."
            }
            Self::SearchTraces => {
                "Fetches a list of raw trace spans. Use this to find specific examples of traces, not for summarized data or charts."
            }
            Self::AggregateTraces => {
                "Calculates aggregate metrics from trace data. Use this for charts and tables about trace performance."
            }
            Self::ListServices => {
                "Fetches a list of all unique service names that have sent traces in the last 24 hours."
            }
        }
    }

    /// JSON Schema of the tool's arguments.
    pub fn input_schema(self) -> Value {
        match self {
            Self::SearchLogs => schema_of::<SearchLogsParams>(),
            Self::AggregateLogs => schema_of::<AggregateLogsParams>(),
            Self::SearchTraces => schema_of::<SearchTracesParams>(),
            Self::AggregateTraces => schema_of::<AggregateTracesParams>(),
            Self::ListServices => schema_of::<ListServicesParams>(),
        }
    }

    /// Entry for an MCP `tools/list` response.
    pub fn descriptor(self) -> Value {
        serde_json::json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = SignozError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| SignozError::InvalidArgument(format!("unknown tool: {s}")))
    }
}

fn schema_of<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.entry("properties")
            .or_insert_with(|| serde_json::json!({}));
    }
    schema
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

/// Result of one tool call: always a list of text blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolResult {
    pub content: Vec<Content>,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
        }
    }

    /// All text blocks joined by newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                Content::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
