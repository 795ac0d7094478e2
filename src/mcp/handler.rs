//! Request dispatch for the calendar MCP server

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::protocol::{
    error_codes, methods, InitializeResult, McpHandler, McpRequest, McpResponse, ToolCallResult,
};
use super::tools::get_tool_definitions;
use crate::google::CalendarApi;
use crate::tools::call_tool;

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Routes MCP requests to the calendar tools
pub struct CalendarHandler {
    api: Arc<dyn CalendarApi>,
}

impl CalendarHandler {
    pub fn new(api: Arc<dyn CalendarApi>) -> Self {
        Self { api }
    }

    async fn handle_tool_call(&self, name: &str, arguments: Value) -> ToolCallResult {
        match call_tool(self.api.as_ref(), name, arguments).await {
            Ok(value) => ToolCallResult::json(&value),
            Err(e) => {
                tracing::warn!(tool = name, kind = ?e.kind(), "tool failed: {}", e);
                match e.details() {
                    Some(details) => ToolCallResult::error_with_details(e.user_message(), &details),
                    None => ToolCallResult::error(e.user_message()),
                }
            }
        }
    }
}

#[async_trait]
impl McpHandler for CalendarHandler {
    async fn handle_request(&self, request: McpRequest) -> McpResponse {
        match request.method.as_str() {
            methods::INITIALIZE => {
                McpResponse::success(request.id, json!(InitializeResult::default()))
            }
            methods::INITIALIZED => McpResponse::success(request.id, json!({})),
            methods::PING => McpResponse::success(request.id, json!({})),
            methods::LIST_TOOLS => McpResponse::success(
                request.id,
                json!({"tools": get_tool_definitions()}),
            ),
            methods::CALL_TOOL => {
                let params: ToolCallParams = match serde_json::from_value(request.params) {
                    Ok(p) => p,
                    Err(e) => {
                        return McpResponse::error(
                            request.id,
                            error_codes::INVALID_PARAMS,
                            format!("Invalid tools/call params: {}", e),
                        )
                    }
                };
                let result = self.handle_tool_call(&params.name, params.arguments).await;
                McpResponse::success(request.id, json!(result))
            }
            other => McpResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        }
    }
}
