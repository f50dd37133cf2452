use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::BuilderQuery;
use crate::time::TimeRange;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PanelType {
    List,
    Graph,
    Table,
    Trace,
    Value,
}

impl PanelType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Graph => "graph",
            Self::Table => "table",
            Self::Trace => "trace",
            Self::Value => "value",
        }
    }
}

impl fmt::Display for PanelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    Builder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeQuery {
    pub query_type: QueryType,
    pub panel_type: PanelType,
    pub builder_queries: BTreeMap<String, BuilderQuery>,
}

/// Body of a `POST /api/v4/query_range` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRangePayload {
    /// Milliseconds since the epoch.
    pub start: i64,
    pub end: i64,
    /// Seconds.
    pub step: u64,
    pub composite_query: CompositeQuery,
}

impl QueryRangePayload {
    /// Wraps a single builder query, keyed by its own name.
    pub fn single(range: TimeRange, step: u64, panel_type: PanelType, query: BuilderQuery) -> Self {
        let mut builder_queries = BTreeMap::new();
        builder_queries.insert(query.query_name.clone(), query);
        Self {
            start: range.start_ms,
            end: range.end_ms,
            step,
            composite_query: CompositeQuery {
                query_type: QueryType::Builder,
                panel_type,
                builder_queries,
            },
        }
    }

    pub fn panel_type(&self) -> PanelType {
        self.composite_query.panel_type
    }

    /// The populated query, if any.
    pub fn query(&self) -> Option<&BuilderQuery> {
        self.composite_query.builder_queries.values().next()
    }
}
