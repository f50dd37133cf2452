use std::time::Duration;

use serde_json::json;
use signoz_mcp_client::HttpBackend;
use signoz_mcp_core::backend::QueryBackend;
use signoz_mcp_core::config::Config;
use signoz_mcp_core::payload::{PanelType, QueryRangePayload};
use signoz_mcp_core::query::{BuilderQuery, DataSource};
use signoz_mcp_core::time::TimeRange;
use signoz_mcp_core::SignozError;
use testkit::{MockServer, SpanRecorder, sample_logs_body};

fn config_for(server: &MockServer) -> Config {
    Config {
        base_url: Some(format!("{}/", server.base_url())),
        api_key: Some("test-key".to_string()),
        ..Config::default()
    }
}

fn list_payload() -> QueryRangePayload {
    QueryRangePayload::single(
        TimeRange::new(1_000, 2_000),
        0,
        PanelType::List,
        BuilderQuery::new(DataSource::Logs).page_size(Some(20)),
    )
}

#[tokio::test]
async fn posts_payload_with_credentials() -> anyhow::Result<()> {
    let server = MockServer::start(vec![(200, sample_logs_body())]).await?;
    let backend = HttpBackend::from_config(&config_for(&server))?;

    let resp = backend.query_range(&list_payload()).await?;
    let entry = resp.first_result().expect("result entry");
    assert_eq!(entry.list.as_ref().map(Vec::len), Some(2));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.headers.get("signoz-api-key").map(String::as_str), Some("test-key"));
    assert_eq!(
        req.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    assert!(
        req.headers
            .get("user-agent")
            .is_some_and(|ua| ua.starts_with("signoz-mcp/"))
    );
    assert_eq!(req.body["start"], 1_000);
    assert_eq!(req.body["compositeQuery"]["panelType"], "list");
    assert_eq!(
        req.body["compositeQuery"]["builderQueries"]["A"]["pageSize"],
        20
    );
    Ok(())
}

#[tokio::test]
async fn auth_failures_carry_status() -> anyhow::Result<()> {
    let server = MockServer::start(vec![(401, json!({"message": "invalid api key"}))]).await?;
    let backend = HttpBackend::from_config(&config_for(&server))?;

    let err = backend.query_range(&list_payload()).await.unwrap_err();
    assert!(err.is_auth_failure());
    assert_eq!(
        err.to_string(),
        "API call failed with status 401: invalid api key"
    );
    Ok(())
}

#[tokio::test]
async fn server_errors_fall_back_to_reason_phrase() -> anyhow::Result<()> {
    let server = MockServer::start(vec![(502, json!(null))]).await?;
    let backend = HttpBackend::from_config(&config_for(&server))?;

    let err = backend.query_range(&list_payload()).await.unwrap_err();
    assert!(matches!(
        err,
        SignozError::Backend {
            status: Some(502),
            ..
        }
    ));
    assert!(err.to_string().contains("Bad Gateway"));
    Ok(())
}

#[tokio::test]
async fn no_retry_after_failure() -> anyhow::Result<()> {
    let server = MockServer::start(vec![
        (500, json!({"error": "internal"})),
        (200, sample_logs_body()),
    ])
    .await?;
    let backend = HttpBackend::from_config(&config_for(&server))?;

    assert!(backend.query_range(&list_payload()).await.is_err());
    assert_eq!(server.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn timeout_is_a_backend_failure_without_status() -> anyhow::Result<()> {
    let server =
        MockServer::start_with_delay(vec![(200, sample_logs_body())], Duration::from_secs(2))
            .await?;
    let cfg = Config {
        timeout: Duration::from_millis(200),
        ..config_for(&server)
    };
    let backend = HttpBackend::from_config(&cfg)?;

    let err = backend.query_range(&list_payload()).await.unwrap_err();
    assert!(matches!(err, SignozError::Backend { status: None, .. }));
    assert!(err.to_string().starts_with("API call failed with status N/A"));
    Ok(())
}

#[tokio::test]
async fn connection_refused_is_reported() -> anyhow::Result<()> {
    let cfg = Config {
        base_url: Some("http://127.0.0.1:1".to_string()),
        api_key: Some("k".to_string()),
        ..Config::default()
    };
    let backend = HttpBackend::from_config(&cfg)?;
    let err = backend.query_range(&list_payload()).await.unwrap_err();
    assert!(matches!(err, SignozError::Backend { status: None, .. }));
    Ok(())
}

#[tokio::test]
async fn each_request_opens_a_query_range_span() -> anyhow::Result<()> {
    let recorder = SpanRecorder::new();
    let _guard = recorder.install();
    let server = MockServer::start(vec![(200, sample_logs_body())]).await?;
    let backend = HttpBackend::from_config(&config_for(&server))?;

    backend.query_range(&list_payload()).await?;

    let spans = recorder.named("query_range");
    assert_eq!(spans.len(), 1);
    let fields = &spans[0].fields;
    assert_eq!(fields.get("panel").map(String::as_str), Some("list"));
    assert_eq!(fields.get("start").map(String::as_str), Some("1000"));
    assert_eq!(fields.get("end").map(String::as_str), Some("2000"));
    Ok(())
}
