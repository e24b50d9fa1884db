//! MCP Server implementation
//!
//! Implements the Model Context Protocol server for stdio transport.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info};

use crate::error::{McpError, Result};
use crate::mcp::dispatch::Dispatcher;
use crate::mcp::types::*;

/// Upper bound on requests being handled at once on one transport
pub const MAX_IN_FLIGHT: usize = 64;

/// MCP server fronting a single operation catalog
pub struct McpServer {
    info: ServerInfo,

    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(info: ServerInfo, dispatcher: Dispatcher) -> Self {
        Self {
            info,
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run the server on stdio until stdin closes
    pub async fn run_stdio(self: Arc<Self>) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout(), MAX_IN_FLIGHT)
            .await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`.
    ///
    /// Each line is handled on its own task and a single writer task
    /// serializes the responses. At most `max_in_flight` lines are handled at
    /// once; reading pauses until one finishes.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W, max_in_flight: usize) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let max_in_flight = max_in_flight.max(1);
        info!(
            server = %self.info.name,
            version = %self.info.version,
            operations = self.dispatcher.registry().len(),
            max_in_flight,
            "MCP server listening"
        );

        let permits = Arc::new(Semaphore::new(max_in_flight));
        let (tx, mut rx) = mpsc::channel::<String>(max_in_flight);

        let writer = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| McpError::TransportError {
                    message: e.to_string(),
                })?;
            let server = Arc::clone(&self);
            let tx = tx.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let Some(response) = server.handle_message(&line).await else {
                    return;
                };
                match serde_json::to_string(&response) {
                    Ok(encoded) => {
                        if tx.send(encoded).await.is_err() {
                            error!("response dropped: writer is gone");
                        }
                    }
                    Err(e) => error!(error = %e, "failed to encode response"),
                }
            });
        }

        // In-flight tasks hold their own senders; the writer drains them.
        drop(tx);
        writer
            .await
            .map_err(|e| McpError::TransportError {
                message: e.to_string(),
            })??;

        info!(server = %self.info.name, "input closed, shutting down");
        Ok(())
    }

    /// Handle one incoming JSON-RPC message.
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let raw: Value = match serde_json::from_str(message) {
            Ok(raw) => raw,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Parse error: {e}")),
                ));
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(raw.clone()) {
            Ok(req) => req,
            Err(e) => {
                let id = raw
                    .get("id")
                    .and_then(|id| serde_json::from_value(id.clone()).ok());
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {e}")),
                ));
            }
        };

        debug!(method = %request.method, "request received");

        if request.is_notification() {
            if request.method == methods::INITIALIZED {
                info!(server = %self.info.name, "client initialized");
            }
            return None;
        }

        let response = match request.method.as_str() {
            methods::INITIALIZE => match self.handle_initialize() {
                Ok(result) => JsonRpcResponse::success(request.id, result),
                Err(e) => {
                    JsonRpcResponse::error(request.id, JsonRpcError::internal_error(e.to_string()))
                }
            },
            methods::PING => JsonRpcResponse::success(request.id, json!({})),
            methods::LIST_TOOLS => match self.handle_list_tools() {
                Ok(result) => JsonRpcResponse::success(request.id, result),
                Err(e) => {
                    JsonRpcResponse::error(request.id, JsonRpcError::internal_error(e.to_string()))
                }
            },
            methods::CALL_TOOL => {
                let result = self.handle_call_tool(&request).await;
                JsonRpcResponse::success(request.id, result)
            }
            _ => JsonRpcResponse::error(
                request.id,
                JsonRpcError::method_not_found(&request.method),
            ),
        };

        Some(response)
    }

    fn handle_initialize(&self) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: self.info.clone(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
            },
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.dispatcher.list_operations(),
        };

        Ok(serde_json::to_value(result)?)
    }

    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> Value {
        let params: CallToolParams = match request.params.as_ref() {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(params) => params,
                Err(e) => {
                    return envelope_value(CallToolResult::error(format!(
                        "Invalid tool parameters: {e}"
                    )));
                }
            },
            None => return envelope_value(CallToolResult::error("Missing tool parameters")),
        };

        let outcome = self.dispatcher.invoke(&params.name, &params.arguments).await;
        envelope_value(to_envelope(outcome))
    }
}

fn envelope_value(result: CallToolResult) -> Value {
    serde_json::to_value(&result).unwrap_or_else(|e| {
        error!(error = %e, "failed to encode tool result");
        json!({
            "content": [{"type": "text", "text": format!("Error: {e}")}],
            "isError": true
        })
    })
}
