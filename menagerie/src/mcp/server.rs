//! MCP server implementation
//!
//! Implements the stdio transport for the Model Context Protocol.

use super::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo, ToolResult,
    MCP_PROTOCOL_VERSION,
};
use super::tools::{get_tool_definitions, handle_tool_call};
use crate::config::Config;
use crate::index::SqliteIndex;
use crate::page::DEFAULT_PAGE_SIZE;
use crate::service::AnimalService;
use crate::store::Store;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};

/// MCP server for Menagerie
///
/// Speaks JSON-RPC over stdio and exposes the animal service as tools.
pub struct McpServer {
    service: AnimalService<SqliteIndex>,
    default_page_size: usize,
}

impl McpServer {
    /// Create a server from a resolved configuration
    pub fn new(config: &Config) -> crate::Result<Self> {
        let store = Store::open(&config.database)?;
        let index = SqliteIndex::open(&config.index, &config.index_name)?;
        Ok(Self {
            service: AnimalService::new(store, index, config.index_name.clone()),
            default_page_size: config.default_page_size,
        })
    }

    /// Create a server around an existing service
    pub fn with_service(service: AnimalService<SqliteIndex>) -> Self {
        Self {
            service,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn service(&self) -> &AnimalService<SqliteIndex> {
        &self.service
    }

    /// Run the MCP server on stdio until EOF
    pub fn run(&self) -> crate::Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.serve(BufReader::new(stdin.lock()), stdout.lock())
    }

    /// Serve newline-delimited JSON-RPC requests from `reader` until EOF
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> crate::Result<()> {
        tracing::info!(
            "Menagerie MCP server started (protocol version {})",
            MCP_PROTOCOL_VERSION
        );

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    tracing::debug!("Received: {}", line);

                    let response = match serde_json::from_str::<JsonRpcRequest>(line) {
                        Ok(request) => self.handle_request(request),
                        Err(e) => JsonRpcResponse::error(
                            None,
                            JsonRpcError::parse_error(format!("Parse error: {}", e)),
                        ),
                    };

                    let response_json = serde_json::to_string(&response)?;
                    writeln!(writer, "{}", response_json)?;
                    writer.flush()?;
                    tracing::debug!("Sent: {}", response_json);
                }
                Err(e) => {
                    tracing::error!("Read error: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request
    pub fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported JSON-RPC version: {}",
                    request.jsonrpc
                )),
            );
        }

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "notifications/initialized" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": get_tool_definitions() })),
            "tools/call" => self.handle_tools_call(&request.params),
            "ping" => Ok(json!({})),
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default()
        })
    }

    fn handle_tools_call(&self, params: &Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params
            .as_ref()
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;

        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?;

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let result: ToolResult =
            handle_tool_call(&self.service, self.default_page_size, tool_name, &arguments)?;

        serde_json::to_value(result).map_err(|e| JsonRpcError::server_error(e.to_string()))
    }
}
