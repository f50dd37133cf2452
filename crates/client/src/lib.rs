use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use signoz_mcp_core::backend::QueryBackend;
use signoz_mcp_core::config::Config;
use signoz_mcp_core::error::{Result, SignozError};
use signoz_mcp_core::payload::QueryRangePayload;
use signoz_mcp_core::render::QueryRangeResponse;

pub const API_KEY_HEADER: &str = "signoz-api-key";

/// Sends `query_range` requests to a SigNoz instance. One attempt per call.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    url: String,
}

impl HttpBackend {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let url = cfg.query_range_url()?;
        let api_key = cfg.api_key.as_deref().unwrap_or_default();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_str(api_key)
                .map_err(|e| SignozError::Config(format!("invalid API key: {e}")))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&cfg.user_agent)
                .map_err(|e| SignozError::Config(format!("invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .timeout(cfg.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SignozError::Internal(format!("failed to build http client: {e}")))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl QueryBackend for HttpBackend {
    #[tracing::instrument(
        name = "query_range",
        skip_all,
        fields(panel = %payload.panel_type(), start = payload.start, end = payload.end)
    )]
    async fn query_range(&self, payload: &QueryRangePayload) -> Result<QueryRangeResponse> {
        tracing::debug!(url = %self.url, "sending query_range request");

        let resp = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, timeout = e.is_timeout(), "query_range request failed");
                SignozError::backend(e.status().map(|s| s.as_u16()), e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            let err = SignozError::backend(Some(status.as_u16()), message);
            if err.is_auth_failure() {
                tracing::error!(
                    status = status.as_u16(),
                    "authentication error: check SIGNOZ_API_KEY"
                );
            } else {
                tracing::warn!(status = status.as_u16(), error = %err, "query_range rejected");
            }
            return Err(err);
        }

        resp.json::<QueryRangeResponse>().await.map_err(|e| {
            SignozError::backend(
                Some(status.as_u16()),
                format!("failed to decode response body: {e}"),
            )
        })
    }
}

/// Pulls `message` (or `error`) out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .into_iter()
        .find_map(|key| value.get(key)?.as_str().map(str::to_string))
        .filter(|m| !m.is_empty())
}
