use serde::{Deserialize, Serialize};

/// Keys the backend indexes as resource attributes.
pub const RESOURCE_KEYS: &[&str] = &[
    "service.name",
    "k8s.deployment.name",
    "deployment_name",
    "serviceName",
];

/// Any key under this prefix is treated as a resource attribute.
pub const RESOURCE_PREFIX: &str = "k8s.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Int64,
    Float64,
    Bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    #[default]
    Tag,
    Resource,
    Span,
    Log,
    Timestamp,
    Attribute,
    #[serde(rename = "")]
    Unspecified,
}

/// A queryable field and how the backend should resolve it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub key: String,
    pub data_type: DataType,
    #[serde(rename = "type")]
    pub kind: AttributeKind,
    pub is_column: bool,
}

impl Attribute {
    pub fn new(
        key: impl Into<String>,
        data_type: DataType,
        kind: AttributeKind,
        is_column: bool,
    ) -> Self {
        Self {
            key: key.into(),
            data_type,
            kind,
            is_column,
        }
    }
}

/// Decides whether a bare field name is resource-scoped or a generic tag.
///
/// This is a best-effort mapping: fields the backend stores as resource
/// attributes but which are outside the allow-list still come back as
/// [`AttributeKind::Tag`].
#[derive(Debug, Clone, Copy)]
pub struct AttributeClassifier {
    resource_keys: &'static [&'static str],
    resource_prefix: &'static str,
}

impl Default for AttributeClassifier {
    fn default() -> Self {
        Self::new(RESOURCE_KEYS, RESOURCE_PREFIX)
    }
}

impl AttributeClassifier {
    pub const fn new(
        resource_keys: &'static [&'static str],
        resource_prefix: &'static str,
    ) -> Self {
        Self {
            resource_keys,
            resource_prefix,
        }
    }

    pub fn classify(&self, key: &str) -> AttributeKind {
        if self.resource_keys.contains(&key) || key.starts_with(self.resource_prefix) {
            AttributeKind::Resource
        } else {
            AttributeKind::Tag
        }
    }

    /// String-typed column attribute for a group-by field.
    pub fn group_by(&self, key: &str) -> Attribute {
        Attribute::new(key, DataType::String, self.classify(key), true)
    }
}
