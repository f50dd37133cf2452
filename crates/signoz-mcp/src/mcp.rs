use serde::Deserialize;
use serde_json::{Value, json};
use signoz_mcp_core::backend::QueryBackend;
use signoz_mcp_tools::{ToolKind, ToolRunner};
use tokio::io::{AsyncBufReadExt, BufReader};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct McpReq {
    id: Option<Value>,
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

fn mcp_ok(id: Option<Value>, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn mcp_err(id: Option<Value>, code: i64, message: impl Into<String>) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message.into()}})
}

/// Newline-delimited JSON-RPC over stdio, one request per line.
pub struct McpServer<B> {
    runner: ToolRunner<B>,
}

impl<B: QueryBackend> McpServer<B> {
    pub fn new(runner: ToolRunner<B>) -> Self {
        Self { runner }
    }

    pub async fn serve_stdio(&self) -> anyhow::Result<()> {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();

        while let Some(line) = lines.next_line().await? {
            if let Some(reply) = self.handle_line(&line).await {
                println!("{}", serde_json::to_string(&reply)?);
            }
        }
        tracing::debug!("stdin closed, stopping mcp server");
        Ok(())
    }

    /// Reply for one input line; `None` for blank lines and notifications.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        if line.trim().is_empty() {
            return None;
        }
        let input = match serde_json::from_str::<McpReq>(line) {
            Ok(v) => v,
            Err(e) => return Some(mcp_err(None, PARSE_ERROR, e.to_string())),
        };

        let method = input.method.as_deref().unwrap_or_default();
        if input.id.is_none() {
            tracing::debug!(method, "notification");
            return None;
        }

        let reply = match method {
            "initialize" => mcp_ok(
                input.id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "serverInfo": {"name": "signoz-mcp", "version": env!("CARGO_PKG_VERSION")},
                    "capabilities": {"tools": {"listChanged": false}}
                }),
            ),
            "ping" => mcp_ok(input.id, json!({})),
            "tools/list" => {
                let tools = ToolKind::ALL
                    .into_iter()
                    .map(ToolKind::descriptor)
                    .collect::<Vec<_>>();
                mcp_ok(input.id, json!({"tools": tools}))
            }
            "tools/call" => self.call_tool(input.id, input.params).await,
            other => mcp_err(
                input.id,
                METHOD_NOT_FOUND,
                format!(
                    "unsupported method '{other}' (expected initialize, ping, tools/list, tools/call)"
                ),
            ),
        };
        Some(reply)
    }

    async fn call_tool(&self, id: Option<Value>, params: Option<Value>) -> Value {
        let params = params.unwrap_or(Value::Null);
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return mcp_err(id, INVALID_PARAMS, "missing tool name");
        };
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);

        match self.runner.call(name, args).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => mcp_ok(id, value),
                Err(e) => mcp_err(id, INVALID_PARAMS, e.to_string()),
            },
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "rejected tool call");
                mcp_err(id, INVALID_PARAMS, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testkit::{ScriptedBackend, table_body};

    use super::*;

    fn server(backend: ScriptedBackend) -> McpServer<ScriptedBackend> {
        McpServer::new(ToolRunner::new(backend))
    }

    #[tokio::test]
    async fn initialize_reports_tool_capability() {
        let reply = server(ScriptedBackend::new())
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(reply["result"]["serverInfo"]["name"], "signoz-mcp");
        assert!(reply["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_has_all_five_tools() {
        let reply = server(ScriptedBackend::new())
            .handle_line(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#)
            .await
            .unwrap();
        let names = reply["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "search-logs",
                "aggregate-logs",
                "search-traces",
                "aggregate-traces",
                "list-services"
            ]
        );
        assert_eq!(reply["result"]["tools"][0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let srv = server(ScriptedBackend::new());
        assert!(
            srv.handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .await
                .is_none()
        );
        assert!(srv.handle_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn malformed_and_unknown_requests_are_errors() {
        let srv = server(ScriptedBackend::new());
        let reply = srv.handle_line("{not json").await.unwrap();
        assert_eq!(reply["error"]["code"], PARSE_ERROR);

        let reply = srv
            .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
        assert!(
            reply["error"]["message"]
                .as_str()
                .unwrap()
                .contains("unsupported method")
        );

        let reply = srv
            .handle_line(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"nope"}}"#)
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], INVALID_PARAMS);
        assert_eq!(reply["error"]["message"], "invalid argument: unknown tool: nope");
    }

    #[tokio::test]
    async fn tools_call_returns_text_content() {
        let srv = server(ScriptedBackend::new().respond(table_body(
            &["serviceName"],
            vec![vec![json!("checkout")]],
        )));
        let reply = srv
            .handle_line(
                r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"list-services","arguments":{}}}"#,
            )
            .await
            .unwrap();
        assert_eq!(
            reply["result"],
            json!({"content": [{"type": "text", "text": "Found the following services:\n\n- checkout"}]})
        );
    }

    #[tokio::test]
    async fn validation_failures_are_tool_results() {
        let srv = server(ScriptedBackend::new());
        let reply = srv
            .handle_line(
                r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"aggregate-traces","arguments":{"aggregationFunction":"avg"}}}"#,
            )
            .await
            .unwrap();
        assert!(reply.get("error").is_none());
        assert_eq!(
            reply["result"]["content"][0]["text"],
            "Error: 'aggregateField' is required for 'avg'."
        );
    }
}
