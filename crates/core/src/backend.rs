use std::future::Future;

use crate::error::Result;
use crate::payload::QueryRangePayload;
use crate::render::QueryRangeResponse;

/// Executes a `query_range` request against the telemetry store.
pub trait QueryBackend: Send + Sync {
    fn query_range(
        &self,
        payload: &QueryRangePayload,
    ) -> impl Future<Output = Result<QueryRangeResponse>> + Send;
}
