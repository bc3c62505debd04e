//! MCP (Model Context Protocol) server for Menagerie
//!
//! This module implements an MCP server using stdio transport, exposing the
//! animal service to AI agents.
//!
//! ## Tools Exposed
//!
//! - `animal_search` - Ranked, seed-stable search by name
//! - `animal_get` - Retrieve an animal by id
//! - `animal_list` - Page through all animals
//! - `animal_create` / `animal_update` / `animal_delete` - Writes (mirrored into the index)
//! - `animal_reindex` - Re-push every stored animal into the index
//! - `animal_status` - Record and index counts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use menagerie::{mcp::McpServer, Config};
//!
//! let server = McpServer::new(&Config::default()).unwrap();
//! server.run().unwrap();
//! ```

mod protocol;
mod server;
pub mod tools;

pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolDefinition, ToolResult, NOT_FOUND_CODE,
};
pub use server::McpServer;
