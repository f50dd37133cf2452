//! The five SigNoz tools: argument types, payload planning and execution.

pub mod params;
pub mod planner;
pub mod runner;
pub mod tool;

pub use params::{
    AggregateLogsParams, AggregatePanel, AggregateTracesParams, AggregationFunction,
    ListServicesParams, SearchLogsParams, SearchTracesParams,
};
pub use planner::QueryPlanner;
pub use runner::ToolRunner;
pub use tool::{Content, ToolKind, ToolResult};
