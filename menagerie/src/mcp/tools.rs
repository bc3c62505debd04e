//! MCP tool handlers for Menagerie
//!
//! Each tool handler processes a specific tool call and returns results.

use super::protocol::{JsonRpcError, ToolDefinition, ToolResult};
use crate::index::SqliteIndex;
use crate::model::AnimalDto;
use crate::page::{Page, PageRequest};
use crate::service::AnimalService;
use serde_json::{json, Value};

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer", "description": description }
        },
        "required": ["id"]
    })
}

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "animal_search",
            "Ranked search for animals by name. Matches are phrase-prefix on the name; \
             promoted animals come first and the rest are shuffled. The same seed always \
             yields the same order, so reuse it to page through one shuffle.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search text" },
                    "seed": { "type": "string", "description": "Shuffle seed (default: empty string)" },
                    "page": { "type": "integer", "description": "Zero-based page (default: 0)", "default": 0 },
                    "size": { "type": "integer", "description": "Page size (default: 20)", "default": 20 }
                },
                "required": ["query"]
            }),
        ),
        tool("animal_get", "Get an animal by id.", id_schema("Animal id")),
        tool(
            "animal_list",
            "List animals in id order.",
            json!({
                "type": "object",
                "properties": {
                    "page": { "type": "integer", "default": 0 },
                    "size": { "type": "integer", "default": 20 }
                },
                "required": []
            }),
        ),
        tool(
            "animal_create",
            "Create an animal. Names are unique.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "promoted": { "type": "boolean", "default": false }
                },
                "required": ["name"]
            }),
        ),
        tool(
            "animal_update",
            "Update an existing animal.",
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer" },
                    "name": { "type": "string" },
                    "promoted": { "type": "boolean", "default": false }
                },
                "required": ["id", "name"]
            }),
        ),
        tool("animal_delete", "Delete an animal by id.", id_schema("Animal id")),
        tool(
            "animal_reindex",
            "Push every stored animal into the search index again.",
            json!({ "type": "object", "properties": {}, "required": [] }),
        ),
        tool(
            "animal_status",
            "Record and index counts.",
            json!({ "type": "object", "properties": {}, "required": [] }),
        ),
    ]
}

/// Handle tool call dispatch
pub fn handle_tool_call(
    service: &AnimalService<SqliteIndex>,
    default_page_size: usize,
    tool_name: &str,
    arguments: &Value,
) -> Result<ToolResult, JsonRpcError> {
    match tool_name {
        "animal_search" => tool_search(service, default_page_size, arguments),
        "animal_get" => tool_get(service, arguments),
        "animal_list" => tool_list(service, default_page_size, arguments),
        "animal_create" => tool_create(service, arguments),
        "animal_update" => tool_update(service, arguments),
        "animal_delete" => tool_delete(service, arguments),
        "animal_reindex" => tool_reindex(service),
        "animal_status" => tool_status(service),
        _ => Err(JsonRpcError::invalid_params(format!(
            "Unknown tool: {}",
            tool_name
        ))),
    }
}

fn page_request(args: &Value, default_page_size: usize) -> PageRequest {
    let page = args.get("page").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
    let size = args
        .get("size")
        .and_then(|v| v.as_u64())
        .map(|s| s as usize)
        .unwrap_or(default_page_size);
    PageRequest::of(page, size)
}

fn require_id(args: &Value) -> Result<i64, JsonRpcError> {
    args.get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| JsonRpcError::invalid_params("Missing id parameter"))
}

fn page_json(page: &Page<AnimalDto>) -> Value {
    json!({
        "animals": page.content,
        "total": page.total,
        "page": page.request.page,
        "size": page.request.size,
        "totalPages": page.total_pages(),
    })
}

fn tool_search(
    service: &AnimalService<SqliteIndex>,
    default_page_size: usize,
    args: &Value,
) -> Result<ToolResult, JsonRpcError> {
    let query = args
        .get("query")
        .and_then(|v| v.as_str())
        .ok_or_else(|| JsonRpcError::invalid_params("Missing query parameter"))?;
    let seed = args.get("seed").and_then(|v| v.as_str()).unwrap_or("");

    let page = service.search(query, seed, &page_request(args, default_page_size))?;
    let mut body = page_json(&page);
    body["seed"] = json!(seed);
    Ok(ToolResult::json(&body))
}

fn tool_get(service: &AnimalService<SqliteIndex>, args: &Value) -> Result<ToolResult, JsonRpcError> {
    let id = require_id(args)?;
    let animal = service
        .find_one(id)?
        .ok_or_else(|| JsonRpcError::from(crate::Error::AnimalNotFound(id)))?;
    Ok(ToolResult::json(&json!(animal)))
}

fn tool_list(
    service: &AnimalService<SqliteIndex>,
    default_page_size: usize,
    args: &Value,
) -> Result<ToolResult, JsonRpcError> {
    let page = service.find_all(&page_request(args, default_page_size))?;
    Ok(ToolResult::json(&page_json(&page)))
}

fn tool_create(service: &AnimalService<SqliteIndex>, args: &Value) -> Result<ToolResult, JsonRpcError> {
    let dto: AnimalDto = serde_json::from_value(args.clone())
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid animal: {}", e)))?;
    let created = service.create(&dto)?;
    Ok(ToolResult::json(&json!(created)))
}

fn tool_update(service: &AnimalService<SqliteIndex>, args: &Value) -> Result<ToolResult, JsonRpcError> {
    let dto: AnimalDto = serde_json::from_value(args.clone())
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid animal: {}", e)))?;
    let updated = service.update(&dto)?;
    Ok(ToolResult::json(&json!(updated)))
}

fn tool_delete(service: &AnimalService<SqliteIndex>, args: &Value) -> Result<ToolResult, JsonRpcError> {
    let id = require_id(args)?;
    service.delete(id)?;
    Ok(ToolResult::text(format!("Deleted animal {}", id)))
}

fn tool_reindex(service: &AnimalService<SqliteIndex>) -> Result<ToolResult, JsonRpcError> {
    let stats = service.reindex_all()?;
    Ok(ToolResult::json(&json!({
        "indexed": stats.indexed,
        "errors": stats.errors,
        "durationMs": stats.duration.as_millis() as u64,
    })))
}

fn tool_status(service: &AnimalService<SqliteIndex>) -> Result<ToolResult, JsonRpcError> {
    let index = service.index();
    let animals = service.store().count()?;
    let indexed = index.count(Some(crate::model::ANIMAL_DOC_TYPE))?;
    Ok(ToolResult::json(&json!({
        "animals": animals,
        "indexed": indexed,
        "inSync": animals == indexed,
        "indexName": service.index_name(),
        "storePath": service.store().path().display().to_string(),
        "indexPath": index.path().display().to_string(),
    })))
}

