use crate::error::{GraphMemError, Result};
use crate::graph::GraphStore;
use crate::mcp::tools;
use crate::mcp::types::*;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader as AsyncBufReader};

/// MCP server over newline-delimited JSON-RPC 2.0 on stdio.
///
/// Requests are handled one at a time; each tool call is one complete store
/// operation (load, mutate, persist), so the server adds no concurrency of
/// its own.
pub struct McpServer {
    store: GraphStore,
}

impl McpServer {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    /// Process one JSON-RPC request.
    ///
    /// Returns `Ok(Some(response))` for requests, `Ok(None)` for
    /// notifications. Handler failures are converted to JSON-RPC error
    /// responses rather than propagated.
    pub fn process_request(
        &self,
        request: JsonRpcRequest,
        initialized: &mut bool,
    ) -> Result<Option<JsonRpcResponse>> {
        // Notifications carry no ID and get no response
        let id = match &request.id {
            Some(id) => id.clone(),
            None => {
                if request.method == "notifications/initialized" {
                    *initialized = true;
                }
                return Ok(None);
            }
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(&id, &request.params),
            "tools/list" => self.handle_tools_list(&id),
            "tools/call" => self.handle_tools_call(&id, &request.params),
            "shutdown" => self.handle_shutdown(&id),
            _ => self.handle_error(
                &id,
                error_codes::METHOD_NOT_FOUND,
                &format!("Unknown method: {}", request.method),
            ),
        };

        match response {
            Ok(resp) => Ok(Some(resp)),
            Err(e) => Ok(Some(JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: id.into(),
                payload: JsonRpcResponsePayload::Error {
                    error: JsonRpcError {
                        code: error_codes::INTERNAL_ERROR,
                        message: format!("Internal error: {}", e),
                        data: Some(serde_json::json!({ "details": e.to_string() })),
                    },
                },
            })),
        }
    }

    /// Run the server: read requests from stdin, write responses to stdout.
    /// Logs go to stderr, per MCP convention.
    pub async fn run(&mut self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdin_reader = AsyncBufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();
        let mut initialized = false;

        log::info!(
            "GraphMem MCP server v{} starting (memory file: {})",
            env!("CARGO_PKG_VERSION"),
            self.store.path().display()
        );

        loop {
            line.clear();
            let bytes_read = stdin_reader.read_line(&mut line).await?;

            // EOF - client disconnected
            if bytes_read == 0 {
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
                Ok(req) => req,
                Err(e) => {
                    // Answer with a parse error if an ID is recoverable
                    if let Some(id) = extract_id_from_line(trimmed) {
                        let error_response = JsonRpcResponse {
                            jsonrpc: "2.0".to_string(),
                            id,
                            payload: JsonRpcResponsePayload::Error {
                                error: JsonRpcError {
                                    code: error_codes::PARSE_ERROR,
                                    message: format!("Parse error: {}", e),
                                    data: None,
                                },
                            },
                        };
                        send_response(&mut stdout, &error_response).await?;
                    }
                    continue;
                }
            };

            match self.process_request(request, &mut initialized) {
                Ok(Some(response)) => {
                    send_response(&mut stdout, &response).await?;
                }
                Ok(None) => {
                    if initialized {
                        log::debug!("Client initialized");
                    }
                }
                Err(e) => {
                    // process_request converts handler errors itself
                    log::error!("Unexpected error processing request: {}", e);
                }
            }
        }

        log::info!("MCP server shutting down");
        Ok(())
    }

    fn handle_initialize(
        &self,
        id: &JsonRpcId,
        params: &Option<Value>,
    ) -> Result<JsonRpcResponse> {
        let params: InitializeParams =
            serde_json::from_value(params.clone().unwrap_or(serde_json::json!({})))
                .map_err(|e| GraphMemError::Protocol(format!("Invalid initialize params: {}", e)))?;

        // Answer recent protocol revisions with the stable version
        let protocol_version = if params.protocol_version.starts_with("2024")
            || params.protocol_version.starts_with("2025")
        {
            "2024-11-05".to_string()
        } else {
            params.protocol_version.clone()
        };

        let result = InitializeResult {
            protocol_version,
            capabilities: serde_json::json!({
                "tools": {}
            }),
            server_info: ServerInfo {
                name: "graphmem".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        self.result_response(id, serde_json::to_value(&result)?)
    }

    fn handle_tools_list(&self, id: &JsonRpcId) -> Result<JsonRpcResponse> {
        let result = ToolsListResult {
            tools: tools::get_tool_definitions(),
        };
        self.result_response(id, serde_json::to_value(&result)?)
    }

    fn handle_tools_call(&self, id: &JsonRpcId, params: &Option<Value>) -> Result<JsonRpcResponse> {
        let params: ToolsCallParams = serde_json::from_value(
            params
                .clone()
                .ok_or_else(|| GraphMemError::Protocol("Missing params for tools/call".to_string()))?,
        )
        .map_err(|e| GraphMemError::Protocol(format!("Invalid tools/call params: {}", e)))?;

        let envelope = match tools::dispatch(&self.store, &params.name, &params.arguments) {
            Ok(envelope) => envelope,
            Err(GraphMemError::Protocol(message)) => {
                return self.handle_error(id, error_codes::INVALID_PARAMS, &message);
            }
            Err(e) => return Err(e),
        };

        let is_error = tools::is_error_envelope(&envelope);
        let result = ToolsCallResult {
            content: vec![ContentItem {
                content_type: "text".to_string(),
                text: serde_json::to_string_pretty(&envelope)?,
            }],
            is_error: is_error.then_some(true),
        };

        self.result_response(id, serde_json::to_value(&result)?)
    }

    fn handle_shutdown(&self, id: &JsonRpcId) -> Result<JsonRpcResponse> {
        self.result_response(id, serde_json::json!(null))
    }

    fn result_response(&self, id: &JsonRpcId, result: Value) -> Result<JsonRpcResponse> {
        Ok(JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: id.clone().into(),
            payload: JsonRpcResponsePayload::Result { result },
        })
    }

    fn handle_error(&self, id: &JsonRpcId, code: i32, message: &str) -> Result<JsonRpcResponse> {
        Ok(JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: id.clone().into(),
            payload: JsonRpcResponsePayload::Error {
                error: JsonRpcError {
                    code,
                    message: message.to_string(),
                    data: None,
                },
            },
        })
    }
}

/// Send a JSON-RPC response to stdout (newline-delimited)
async fn send_response(stdout: &mut tokio::io::Stdout, response: &JsonRpcResponse) -> Result<()> {
    let json = serde_json::to_string(response)?;
    stdout.write_all(json.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

/// Extract the ID field from a malformed JSON line, best-effort, so parse
/// errors can still be answered.
fn extract_id_from_line(line: &str) -> Option<Value> {
    if let Some(id_start) = line.find(r#""id":"#) {
        let id_str = &line[id_start + 5..];
        if let Some(id_end) = id_str.find(',') {
            let id_val = id_str[..id_end].trim();
            if id_val.starts_with('"') && id_val.ends_with('"') {
                return Some(Value::String(id_val[1..id_val.len() - 1].to_string()));
            } else if let Ok(num) = id_val.parse::<i64>() {
                return Some(Value::Number(num.into()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn server(temp_dir: &TempDir) -> McpServer {
        McpServer::new(GraphStore::new(temp_dir.path().join("graph.jsonl")))
    }

    fn request(json: &str) -> JsonRpcRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_id_from_line() {
        let line = r#"{"jsonrpc":"2.0","id":"test-123","method":"test"}"#;
        let id = extract_id_from_line(line);
        assert!(matches!(id, Some(Value::String(ref s)) if s == "test-123"));

        let line = r#"{"jsonrpc":"2.0","id":42,"method":"test"}"#;
        let id = extract_id_from_line(line);
        assert!(matches!(id, Some(Value::Number(ref n)) if n.as_i64() == Some(42)));
    }

    #[test]
    fn test_json_rpc_request_parsing() {
        let req = request(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#);
        assert_eq!(req.method, "initialize");
        assert_eq!(req.jsonrpc, "2.0");
    }

    #[test]
    fn test_notification_gets_no_response() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);
        let mut initialized = false;

        let resp = server
            .process_request(
                request(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#),
                &mut initialized,
            )
            .unwrap();
        assert!(resp.is_none());
        assert!(initialized);
    }

    #[test]
    fn test_unknown_method_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);
        let mut initialized = false;

        let resp = server
            .process_request(
                request(r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#),
                &mut initialized,
            )
            .unwrap()
            .unwrap();
        assert!(matches!(
            resp.payload,
            JsonRpcResponsePayload::Error { ref error } if error.code == error_codes::METHOD_NOT_FOUND
        ));
    }

    #[test]
    fn test_tools_call_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);
        let mut initialized = false;

        let resp = server
            .process_request(
                request(
                    r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"create_entities","arguments":{"entities":[{"name":"Alice","entityType":"person"}]}}}"#,
                ),
                &mut initialized,
            )
            .unwrap()
            .unwrap();

        let JsonRpcResponsePayload::Result { result } = resp.payload else {
            panic!("expected result payload");
        };
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains(r#""status": "success""#));
        assert!(result.get("isError").is_none());
    }

    #[test]
    fn test_tools_call_unknown_tool_is_invalid_params() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);
        let mut initialized = false;

        let resp = server
            .process_request(
                request(
                    r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
                ),
                &mut initialized,
            )
            .unwrap()
            .unwrap();
        assert!(matches!(
            resp.payload,
            JsonRpcResponsePayload::Error { ref error } if error.code == error_codes::INVALID_PARAMS
        ));
    }
}
