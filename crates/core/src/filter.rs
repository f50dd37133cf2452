use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttributeKind, DataType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "nin")]
    NotIn,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "ncontains")]
    NotContains,
    #[serde(rename = "regex")]
    Regex,
    #[serde(rename = "nregex")]
    NotRegex,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "nlike")]
    NotLike,
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "nexists")]
    NotExists,
}

/// Right-hand side of a filter. Not checked against the attribute's data type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StrList(Vec<String>),
    NumList(Vec<f64>),
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterItem {
    pub key: Attribute,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl FilterItem {
    pub fn new(
        key: impl Into<String>,
        data_type: DataType,
        kind: AttributeKind,
        op: FilterOp,
        value: impl Into<FilterValue>,
        is_column: bool,
    ) -> Self {
        Self {
            key: Attribute::new(key, data_type, kind, is_column),
            op,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FilterJoin {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Filter {
    pub items: Vec<FilterItem>,
    pub op: FilterJoin,
}

impl Filter {
    pub fn all(items: Vec<FilterItem>) -> Self {
        Self {
            items,
            op: FilterJoin::And,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_item_serializes_operator_symbol() {
        let item = FilterItem::new(
            "service.name",
            DataType::String,
            AttributeKind::Resource,
            FilterOp::Eq,
            "checkout",
            true,
        );
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "key": {"key": "service.name", "dataType": "string", "type": "resource", "isColumn": true},
                "op": "=",
                "value": "checkout"
            })
        );
    }

    #[test]
    fn bool_values_stay_bool() {
        let item = FilterItem::new(
            "hasError",
            DataType::Bool,
            AttributeKind::Tag,
            FilterOp::Eq,
            false,
            true,
        );
        assert_eq!(serde_json::to_value(&item).unwrap()["value"], false);
    }

    #[test]
    fn default_filter_is_empty_and() {
        let value = serde_json::to_value(Filter::default()).unwrap();
        assert_eq!(value, serde_json::json!({"items": [], "op": "AND"}));
    }

    #[test]
    fn operators_round_trip_from_backend_json() {
        let ops: Vec<FilterOp> =
            serde_json::from_str(r#"["ncontains", "nexists", "<=", "nin"]"#).unwrap();
        assert_eq!(
            ops,
            vec![
                FilterOp::NotContains,
                FilterOp::NotExists,
                FilterOp::Lte,
                FilterOp::NotIn
            ]
        );
    }
}
