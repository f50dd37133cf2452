use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::filter::Filter;

/// Name and expression of the single query every payload carries.
pub const DEFAULT_QUERY_NAME: &str = "A";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Logs,
    Traces,
    Metrics,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOperator {
    #[default]
    Noop,
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
    P05,
    P10,
    P20,
    P25,
    P50,
    P75,
    P90,
    P95,
    P99,
    Rate,
    RateSum,
    RateAvg,
    RateMin,
    RateMax,
}

impl AggregateOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Count => "count",
            Self::CountDistinct => "count_distinct",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::P05 => "p05",
            Self::P10 => "p10",
            Self::P20 => "p20",
            Self::P25 => "p25",
            Self::P50 => "p50",
            Self::P75 => "p75",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
            Self::Rate => "rate",
            Self::RateSum => "rate_sum",
            Self::RateAvg => "rate_avg",
            Self::RateMin => "rate_min",
            Self::RateMax => "rate_max",
        }
    }
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EmptyAttribute {}

/// The attribute an aggregation runs over. `count` without a field sends an
/// empty object rather than omitting the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AggregateAttribute {
    Field(Attribute),
    Empty(EmptyAttribute),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub column_name: String,
    pub order: SortDirection,
}

impl OrderBy {
    pub fn timestamp_desc() -> Self {
        Self {
            column_name: "timestamp".to_string(),
            order: SortDirection::Desc,
        }
    }
}

/// One structured query in the backend's query-builder format.
///
/// Built from [`BuilderQuery::new`] and adjusted with the builder methods.
/// The query name, expression, `having` and `selectColumns` keep their
/// defaults: no operation populates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuilderQuery {
    pub data_source: DataSource,
    pub query_name: String,
    pub expression: String,
    pub disabled: bool,
    pub aggregate_operator: AggregateOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_attribute: Option<AggregateAttribute>,
    pub group_by: Vec<Attribute>,
    pub order_by: Vec<OrderBy>,
    pub filters: Filter,
    pub step_interval: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    pub offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    pub having: Vec<serde_json::Value>,
    pub select_columns: Vec<Attribute>,
    pub reduce_to: String,
}

impl BuilderQuery {
    pub fn new(data_source: DataSource) -> Self {
        Self {
            data_source,
            query_name: DEFAULT_QUERY_NAME.to_string(),
            expression: DEFAULT_QUERY_NAME.to_string(),
            disabled: false,
            aggregate_operator: AggregateOperator::Noop,
            aggregate_attribute: None,
            group_by: Vec::new(),
            order_by: vec![OrderBy::timestamp_desc()],
            filters: Filter::default(),
            step_interval: 60,
            limit: None,
            offset: 0,
            page_size: None,
            having: Vec::new(),
            select_columns: Vec::new(),
            reduce_to: "sum".to_string(),
        }
    }

    pub fn aggregate(mut self, op: AggregateOperator) -> Self {
        self.aggregate_operator = op;
        self
    }

    pub fn aggregate_attribute(mut self, attr: Option<AggregateAttribute>) -> Self {
        self.aggregate_attribute = attr;
        self
    }

    pub fn group_by(mut self, attrs: Vec<Attribute>) -> Self {
        self.group_by = attrs;
        self
    }

    pub fn order_by(mut self, order: Vec<OrderBy>) -> Self {
        self.order_by = order;
        self
    }

    pub fn filters(mut self, filters: Filter) -> Self {
        self.filters = filters;
        self
    }

    pub fn step_interval(mut self, seconds: u64) -> Self {
        self.step_interval = seconds;
        self
    }

    pub fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn reduce_to(mut self, reduce_to: impl Into<String>) -> Self {
        self.reduce_to = reduce_to.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeKind, DataType};
    use crate::filter::FilterJoin;

    #[test]
    fn defaults_match_backend_expectations() {
        for ds in [DataSource::Logs, DataSource::Traces] {
            let q = BuilderQuery::new(ds);
            assert_eq!(q.data_source, ds);
            assert_eq!(q.query_name, "A");
            assert_eq!(q.expression, "A");
            assert!(!q.disabled);
            assert_eq!(q.aggregate_operator, AggregateOperator::Noop);
            assert!(q.aggregate_attribute.is_none());
            assert!(q.group_by.is_empty());
            assert_eq!(q.order_by, vec![OrderBy::timestamp_desc()]);
            assert_eq!(q.step_interval, 60);
            assert!(q.filters.items.is_empty());
            assert_eq!(q.filters.op, FilterJoin::And);
            assert_eq!(q.offset, 0);
            assert_eq!(q.reduce_to, "sum");
        }
    }

    #[test]
    fn default_json_shape() {
        let value = serde_json::to_value(BuilderQuery::new(DataSource::Logs)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "dataSource": "logs",
                "queryName": "A",
                "expression": "A",
                "disabled": false,
                "aggregateOperator": "noop",
                "groupBy": [],
                "orderBy": [{"columnName": "timestamp", "order": "desc"}],
                "filters": {"items": [], "op": "AND"},
                "stepInterval": 60,
                "offset": 0,
                "having": [],
                "selectColumns": [],
                "reduceTo": "sum"
            })
        );
    }

    #[test]
    fn overrides_replace_defaults_including_zero_and_none() {
        let q = BuilderQuery::new(DataSource::Traces)
            .step_interval(0)
            .order_by(Vec::new())
            .aggregate_attribute(Some(AggregateAttribute::Empty(EmptyAttribute {})))
            .aggregate_attribute(None)
            .limit(Some(1000));
        assert_eq!(q.step_interval, 0);
        assert!(q.order_by.is_empty());
        assert!(q.aggregate_attribute.is_none());
        assert_eq!(q.limit, Some(1000));
        assert_eq!(q.query_name, "A");
    }

    #[test]
    fn aggregate_attribute_variants_serialize() {
        let empty = AggregateAttribute::Empty(EmptyAttribute {});
        assert_eq!(serde_json::to_value(&empty).unwrap(), serde_json::json!({}));

        let field = AggregateAttribute::Field(Attribute::new(
            "durationNano",
            DataType::String,
            AttributeKind::Tag,
            false,
        ));
        assert_eq!(
            serde_json::to_value(&field).unwrap()["key"],
            serde_json::json!("durationNano")
        );

        let parsed: AggregateAttribute = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, empty);
    }

    #[test]
    fn operator_names_match_serde() {
        for op in [
            AggregateOperator::CountDistinct,
            AggregateOperator::P99,
            AggregateOperator::RateMax,
        ] {
            assert_eq!(
                serde_json::to_value(op).unwrap(),
                serde_json::json!(op.as_str())
            );
        }
    }
}
