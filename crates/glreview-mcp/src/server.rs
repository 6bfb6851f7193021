//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. Handle tool calls - execute tools via the tool handler
//! 3. Shutdown - stop at end of input

use serde_json::Value;

use crate::handlers::ToolHandler;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability, ToolsListResult, MCP_VERSION,
};
use crate::transport::{IncomingMessage, StdioTransport};

/// Name reported to clients during initialization.
pub const SERVER_NAME: &str = "glreview";

/// MCP server for glreview.
pub struct McpServer {
    handler: ToolHandler,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(handler: ToolHandler) -> Self {
        Self {
            handler,
            initialized: false,
        }
    }

    /// Run the MCP server on stdin/stdout until the client disconnects.
    pub async fn run(&mut self) -> glreview_core::Result<()> {
        tracing::info!("Starting MCP server");

        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Serve requests from `transport` one at a time until end of input.
    ///
    /// Each request is answered before the next line is read, so a
    /// `notifications/cancelled` can only arrive after the call it names has
    /// already completed. Cancellations are therefore logged and otherwise
    /// ignored.
    pub async fn serve(&mut self, transport: &mut StdioTransport) -> glreview_core::Result<()> {
        loop {
            match transport.read_message() {
                Ok(Some(msg)) => {
                    if let Some(resp) = self.handle_message(msg).await {
                        if let Err(e) = transport.write_response(&resp) {
                            tracing::error!("Failed to write response: {}", e);
                            break;
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("Transport error: {}", e);
                    let error_resp = JsonRpcResponse::error(
                        RequestId::Null,
                        JsonRpcError::parse_error(&e.to_string()),
                    );
                    if let Err(e) = transport.write_response(&error_resp) {
                        tracing::error!("Failed to write response: {}", e);
                        break;
                    }
                }
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle an incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
        }
    }

    /// Handle a JSON-RPC request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!("Handling request: {} (id: {:?})", req.method, req.id);

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "ping" => self.handle_ping(req.id),
            method => {
                tracing::warn!("Unknown method: {}", method);
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    /// Handle notifications (no response).
    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                tracing::info!("Client initialized");
            }
            "notifications/cancelled" => {
                tracing::debug!("Request cancelled by client");
            }
            _ => {
                tracing::debug!("Ignoring notification: {}", method);
            }
        }
    }

    /// Handle initialize request.
    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init_params) => {
                    tracing::info!(
                        "Client: {} v{} (protocol: {})",
                        init_params.client_info.name,
                        init_params.client_info.version,
                        init_params.protocol_version
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to parse initialize params: {}", e);
                }
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    /// Handle tools/list request.
    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.handler.available_tools(),
        };
        JsonRpcResponse::from_result(id, &result)
    }

    /// Handle tools/call request.
    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(&e.to_string()),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        tracing::info!("Calling tool: {}", params.name);

        let result = self.handler.execute(&params.name, params.arguments).await;
        JsonRpcResponse::from_result(id, &result)
    }

    /// Handle ping request.
    fn handle_ping(&self, id: RequestId) -> JsonRpcResponse {
        JsonRpcResponse::success(id, serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{JsonRpcNotification, JSONRPC_VERSION};
    use crate::testing::{client_for, MockBranch};
    use crate::transport::tests::SharedWriter;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::Arc;

    fn server_with(mock: &MockServer, branch: MockBranch) -> McpServer {
        McpServer::new(ToolHandler::new(client_for(mock), Arc::new(branch), "123"))
    }

    fn idle_server(mock: &MockServer) -> McpServer {
        let mut branch = MockBranch::new();
        branch.expect_current_branch().times(0);
        server_with(mock, branch)
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(id),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize_response() {
        let mock = MockServer::start();
        let mut server = idle_server(&mock);

        let resp = server
            .handle_request(request(
                1,
                "initialize",
                Some(json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0.0"}
                })),
            ))
            .await;

        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert_eq!(result["serverInfo"]["name"], "glreview");
        assert!(result["capabilities"]["tools"].is_object());
        assert!(server.initialized);
    }

    #[tokio::test]
    async fn test_initialize_tolerates_bad_params() {
        let mock = MockServer::start();
        let mut server = idle_server(&mock);

        let resp = server
            .handle_request(request(1, "initialize", Some(json!({"unexpected": 1}))))
            .await;

        assert!(resp.result.is_some());
        assert!(server.initialized);
    }

    #[test]
    fn test_double_initialize_error() {
        let mock = MockServer::start();
        let mut server = idle_server(&mock);
        server.initialized = true;

        let resp = server.handle_initialize(RequestId::Number(1), None);

        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_tools_list() {
        let mock = MockServer::start();
        let server = idle_server(&mock);

        let resp = server.handle_tools_list(RequestId::Number(1));

        let result: ToolsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.tools.len(), 4);
        assert!(result
            .tools
            .iter()
            .any(|t| t.name == "get_merge_request_comments"));
    }

    #[test]
    fn test_ping() {
        let mock = MockServer::start();
        let server = idle_server(&mock);

        let resp = server.handle_ping(RequestId::String("ping-1".to_string()));

        assert_eq!(resp.result, Some(json!({})));
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mock = MockServer::start();
        let mut server = idle_server(&mock);

        let resp = server.handle_request(request(1, "unknown/method", None)).await;

        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let mock = MockServer::start();
        let mut server = idle_server(&mock);

        let msg = IncomingMessage::Notification(JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: "initialized".to_string(),
            params: None,
        });

        assert!(server.handle_message(msg).await.is_none());
    }

    #[tokio::test]
    async fn test_cancellation_is_ignored() {
        let mock = MockServer::start();
        let mut server = idle_server(&mock);

        let input = [
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1}}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
        ]
        .join("\n");
        let writer = SharedWriter::default();
        let mut transport =
            StdioTransport::new(Box::new(Cursor::new(input)), Box::new(writer.clone()));

        server.serve(&mut transport).await.unwrap();

        let lines = writer.lines();
        assert_eq!(lines.len(), 1);
        let pong: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(pong["id"], 2);
        assert_eq!(pong["result"], json!({}));
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let mock = MockServer::start();
        let mut server = idle_server(&mock);

        let resp = server.handle_request(request(1, "tools/call", None)).await;

        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_invalid_params() {
        let mock = MockServer::start();
        let mut server = idle_server(&mock);

        let resp = server
            .handle_request(request(1, "tools/call", Some(json!("not an object"))))
            .await;

        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_failure_is_a_result_not_a_protocol_error() {
        let mock = MockServer::start();
        let mut server = idle_server(&mock);

        let resp = server
            .handle_request(request(
                1,
                "tools/call",
                Some(json!({"name": "get_merge_request_comments", "arguments": {}})),
            ))
            .await;

        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Merge request ID is required");
    }

    #[tokio::test]
    async fn test_serve_session() {
        let mock = MockServer::start();
        let mut branch = MockBranch::new();
        branch
            .expect_current_branch()
            .times(1)
            .returning(|| Ok("feature-x".to_string()));
        let mut server = server_with(&mock, branch);

        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "",
            "garbage",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get_current_branch","arguments":{}}}"#,
        ]
        .join("\n");
        let writer = SharedWriter::default();
        let mut transport =
            StdioTransport::new(Box::new(Cursor::new(input)), Box::new(writer.clone()));

        server.serve(&mut transport).await.unwrap();

        let lines: Vec<Value> = writer
            .lines()
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["id"], Value::Null);
        assert_eq!(lines[1]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(lines[2]["id"], 2);
        assert_eq!(
            lines[2]["result"]["content"][0]["text"],
            "Current branch is: feature-x"
        );
    }
}
