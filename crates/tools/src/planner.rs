//! Translates tool parameters into `query_range` payloads.
//!
//! Everything here is pure: the same parameters, time and classifier always
//! produce the same payload.

use chrono::{DateTime, Utc};
use signoz_mcp_core::attribute::{Attribute, AttributeClassifier, AttributeKind, DataType};
use signoz_mcp_core::error::{Result, SignozError};
use signoz_mcp_core::filter::{Filter, FilterItem, FilterOp};
use signoz_mcp_core::payload::{PanelType, QueryRangePayload};
use signoz_mcp_core::query::{
    AggregateAttribute, AggregateOperator, BuilderQuery, DataSource, EmptyAttribute,
};
use signoz_mcp_core::time::{AGGREGATE_WINDOW, SEARCH_WINDOW, SERVICES_WINDOW, TimeRange};

use crate::params::{
    AggregateLogsParams, AggregatePanel, AggregateTracesParams, AggregationFunction,
    SearchLogsParams, SearchTracesParams, non_empty,
};

pub const SERVICES_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryPlanner {
    classifier: AttributeClassifier,
}

impl QueryPlanner {
    pub fn new(classifier: AttributeClassifier) -> Self {
        Self { classifier }
    }

    pub fn search_logs(
        &self,
        p: &SearchLogsParams,
        now: DateTime<Utc>,
    ) -> Result<QueryRangePayload> {
        let range = TimeRange::resolve(p.start_time_unix, p.end_time_unix, SEARCH_WINDOW, now)?;

        let mut filters = Vec::new();
        if let Some(service) = non_empty(&p.service_name) {
            filters.push(service_resource_filter(service));
        }
        if let Some(query) = non_empty(&p.query) {
            filters.push(FilterItem::new(
                "body",
                DataType::String,
                AttributeKind::Log,
                FilterOp::Contains,
                query,
                false,
            ));
        }

        let query = BuilderQuery::new(DataSource::Logs)
            .page_size(Some(p.page_size.get()))
            .limit(Some(p.limit.get()))
            .filters(Filter::all(filters))
            .step_interval(0)
            .aggregate(AggregateOperator::Noop);
        Ok(QueryRangePayload::single(range, 0, PanelType::List, query))
    }

    pub fn search_traces(
        &self,
        p: &SearchTracesParams,
        now: DateTime<Utc>,
    ) -> Result<QueryRangePayload> {
        let range = TimeRange::resolve(p.start_time_unix, p.end_time_unix, SEARCH_WINDOW, now)?;
        let filters = trace_filters(&p.service_name, p.has_error);

        let query = BuilderQuery::new(DataSource::Traces)
            .page_size(Some(p.page_size.get()))
            .limit(Some(p.limit.get()))
            .filters(Filter::all(filters))
            .step_interval(0)
            .aggregate(AggregateOperator::Noop);
        Ok(QueryRangePayload::single(range, 0, PanelType::List, query))
    }

    /// Argument checks that need no time range.
    pub fn validate_aggregate_logs(&self, p: &AggregateLogsParams) -> Result<()> {
        require_aggregate_field(p.aggregation_function, non_empty(&p.aggregate_field))
    }

    /// `range` comes from the caller or from latest-log detection.
    pub fn aggregate_logs(
        &self,
        p: &AggregateLogsParams,
        range: TimeRange,
    ) -> Result<QueryRangePayload> {
        self.validate_aggregate_logs(p)?;
        let field = non_empty(&p.aggregate_field);

        let mut filters = Vec::new();
        if let Some(service) = non_empty(&p.service_name) {
            filters.push(service_resource_filter(service));
        }

        // Table panels must not be bucketed by time.
        let step = match p.panel_type {
            AggregatePanel::Graph | AggregatePanel::Value => u64::from(p.step_interval.get()),
            AggregatePanel::Table => 0,
        };

        let query = BuilderQuery::new(DataSource::Logs)
            .aggregate(p.aggregation_function.operator())
            .aggregate_attribute(aggregate_attribute(p.aggregation_function, field))
            .group_by(self.group_by(&p.group_by))
            .filters(Filter::all(filters))
            .step_interval(step)
            .reduce_to(p.aggregation_function.as_str());
        Ok(QueryRangePayload::single(
            range,
            step,
            p.panel_type.panel_type(),
            query,
        ))
    }

    pub fn aggregate_traces(
        &self,
        p: &AggregateTracesParams,
        now: DateTime<Utc>,
    ) -> Result<QueryRangePayload> {
        let field = non_empty(&p.aggregate_field);
        require_aggregate_field(p.aggregation_function, field)?;

        let range =
            TimeRange::resolve(p.start_time_unix, p.end_time_unix, AGGREGATE_WINDOW, now)?;
        let filters = trace_filters(&p.service_name, p.has_error);

        let query = BuilderQuery::new(DataSource::Traces)
            .aggregate(p.aggregation_function.operator())
            .aggregate_attribute(aggregate_attribute(p.aggregation_function, field))
            .group_by(self.group_by(&p.group_by))
            .filters(Filter::all(filters))
            .step_interval(0)
            .reduce_to(p.aggregation_function.as_str());
        Ok(QueryRangePayload::single(range, 0, PanelType::Table, query))
    }

    pub fn list_services(&self, now: DateTime<Utc>) -> QueryRangePayload {
        let query = BuilderQuery::new(DataSource::Traces)
            .aggregate(AggregateOperator::Count)
            .group_by(vec![Attribute::new(
                "serviceName",
                DataType::String,
                AttributeKind::Tag,
                true,
            )])
            .step_interval(0)
            .limit(Some(SERVICES_LIMIT))
            .order_by(Vec::new());
        QueryRangePayload::single(
            TimeRange::trailing(now, SERVICES_WINDOW),
            0,
            PanelType::Table,
            query,
        )
    }

    /// One-row log listing used to find the most recent log.
    pub fn latest_log_probe(&self, now: DateTime<Utc>) -> QueryRangePayload {
        let query = BuilderQuery::new(DataSource::Logs)
            .page_size(Some(1))
            .aggregate(AggregateOperator::Noop);
        QueryRangePayload::single(
            TimeRange::new(0, now.timestamp_millis()),
            0,
            PanelType::List,
            query,
        )
    }

    fn group_by(&self, fields: &Option<Vec<String>>) -> Vec<Attribute> {
        fields
            .iter()
            .flatten()
            .map(|field| self.classifier.group_by(field))
            .collect()
    }
}

fn require_aggregate_field(function: AggregationFunction, field: Option<&str>) -> Result<()> {
    if function != AggregationFunction::Count && field.is_none() {
        return Err(SignozError::InvalidArgument(format!(
            "'aggregateField' is required for '{}'.",
            function.as_str()
        )));
    }
    Ok(())
}

fn aggregate_attribute(
    function: AggregationFunction,
    field: Option<&str>,
) -> Option<AggregateAttribute> {
    match field {
        Some(field) => Some(AggregateAttribute::Field(Attribute::new(
            field,
            DataType::String,
            AttributeKind::Tag,
            false,
        ))),
        None if function == AggregationFunction::Count => {
            Some(AggregateAttribute::Empty(EmptyAttribute {}))
        }
        None => None,
    }
}

fn service_resource_filter(service: &str) -> FilterItem {
    FilterItem::new(
        "service.name",
        DataType::String,
        AttributeKind::Resource,
        FilterOp::Eq,
        service,
        true,
    )
}

fn trace_filters(service_name: &Option<String>, has_error: Option<bool>) -> Vec<FilterItem> {
    let mut filters = Vec::new();
    if let Some(service) = non_empty(service_name) {
        filters.push(FilterItem::new(
            "serviceName",
            DataType::String,
            AttributeKind::Tag,
            FilterOp::Eq,
            service,
            true,
        ));
    }
    if let Some(has_error) = has_error {
        filters.push(FilterItem::new(
            "hasError",
            DataType::Bool,
            AttributeKind::Tag,
            FilterOp::Eq,
            has_error,
            true,
        ));
    }
    filters
}
