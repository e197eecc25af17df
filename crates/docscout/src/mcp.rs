//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC 2.0 over newline-delimited stdio. Tools come from the
//! [`ToolRegistry`]; this module only translates between the protocol and
//! registry calls.

use crate::error::DocScoutError;
use crate::tool::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, warn};

/// MCP protocol revision this server speaks
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: &'static str,
    /// `null` when the request id could not be read
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Standard JSON-RPC error codes
const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// MCP server over a shared tool registry
pub struct McpServer {
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a server exposing the registry's tools
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Handle one request, returning the response to send
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "MCP request");
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "docscout",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": self.registry.definitions() }))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match self.registry.call(tool_name, arguments).await {
            Ok(text) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{
                        "type": "text",
                        "text": text
                    }]
                }),
            ),
            Err(e @ (DocScoutError::UnknownTool(_) | DocScoutError::InvalidArguments(_))) => {
                JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string())
            }
            Err(e) => {
                warn!(tool = tool_name, error = %e, "Tool call failed");
                JsonRpcResponse::success(
                    id,
                    json!({
                        "content": [{
                            "type": "text",
                            "text": format!("Error: {}", e)
                        }],
                        "isError": true
                    }),
                )
            }
        }
    }

    /// Serve newline-delimited JSON-RPC from `input` until it closes
    pub async fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!(error = %e, "Error reading request line");
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    let response =
                        JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e));
                    write_response(&mut output, &response)?;
                    continue;
                }
            };

            // Notifications carry no id and expect no response
            if request.id.is_none() && request.method.starts_with("notifications/") {
                continue;
            }

            let response = self.handle_request(request).await;
            write_response(&mut output, &response)?;
        }
        Ok(())
    }

    /// Serve on the process stdin/stdout
    pub async fn run_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock()).await
    }
}

fn write_response<W: Write>(output: &mut W, response: &JsonRpcResponse) -> io::Result<()> {
    let json = serde_json::to_string(response).unwrap_or_default();
    writeln!(output, "{}", json)?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn server() -> McpServer {
        McpServer::new(Arc::new(ToolRegistry::builder().build().unwrap()))
    }

    async fn roundtrip(input: &str) -> Vec<Value> {
        let mut out = Vec::new();
        server().serve(Cursor::new(input), &mut out).await.unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize() {
        let responses =
            roundtrip(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "docscout");
    }

    #[tokio::test]
    async fn test_tools_list() {
        let responses = roundtrip(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let tools = responses[0]["result"]["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"fetch_url_content"));
        assert!(names.contains(&"search_repo_docs"));
        assert!(tools[0]["inputSchema"]["properties"]["url"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_are_silent() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
            "\n"
        );
        let responses = roundtrip(input).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 3);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let responses = roundtrip("{not json}\n").await;
        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        let response = responses[0].as_object().unwrap();
        assert!(response.contains_key("id"));
        assert!(response["id"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let responses = roundtrip(r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#).await;
        assert_eq!(responses[0]["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let responses = roundtrip(
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
        )
        .await;
        assert_eq!(responses[0]["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_result() {
        let responses = roundtrip(
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"fetch_url_content","arguments":{"url":"ftp://x"}}}"#,
        )
        .await;
        assert_eq!(responses[0]["result"]["isError"], true);
        let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: Invalid URL"));
    }
}
