//! MCP server over stdio.
//!
//! Every registered command is exposed as one tool. `tools/call` dispatches
//! through the registry and returns the response envelope as a JSON text
//! item; `isError` is set whenever the envelope status is not 2xx.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool, ToolAnnotations,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::command::{CommandRegistry, CommandResponse, HostInfo};

const INSTRUCTIONS: &str = "Azure operations exposed as commands. Every tool returns a JSON \
     envelope {status, message, result}; status 200 means success, 4xx/5xx carry a readable \
     message and no result.";

#[derive(Clone)]
pub struct McpServer {
    registry: Arc<CommandRegistry>,
    timeout: Option<Duration>,
}

impl McpServer {
    pub fn new(registry: Arc<CommandRegistry>, timeout: Option<Duration>) -> Self {
        Self { registry, timeout }
    }

    /// Tool descriptors, one per registered command, in name order.
    pub fn tools(&self) -> Vec<Tool> {
        self.registry
            .tool_definitions()
            .into_iter()
            .map(|def| {
                let mut tool = Tool::new(def.name, def.description, Arc::new(def.input_schema));
                tool.annotations = Some(ToolAnnotations {
                    title: Some(def.command.to_string()),
                    read_only_hint: Some(def.read_only),
                    ..Default::default()
                });
                tool
            })
            .collect()
    }

    /// Dispatch one tool call and wrap the envelope for the wire.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        cancellation: CancellationToken,
        client: Option<String>,
    ) -> CallToolResult {
        let mut ctx = self
            .registry
            .new_context()
            .with_host(HostInfo {
                transport: "stdio",
                client,
            })
            .with_cancellation(cancellation);
        if let Some(timeout) = self.timeout {
            ctx = ctx.with_deadline(timeout);
        }

        let raw = arguments.unwrap_or_default();
        let response = self.registry.dispatch(name, &raw, ctx).await;
        envelope_result(&response)
    }
}

fn envelope_result(response: &CommandResponse) -> CallToolResult {
    let text = serde_json::to_string(response).unwrap_or_else(|e| {
        format!(r#"{{"status":500,"message":"failed to serialize response: {e}"}}"#)
    });
    if response.is_success() {
        CallToolResult::success(vec![Content::text(text)])
    } else {
        CallToolResult::error(vec![Content::text(text)])
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let client = context
            .peer
            .peer_info()
            .map(|p| p.client_info.name.clone());
        Ok(self
            .invoke(&request.name, request.arguments, context.ct, client)
            .await)
    }
}

/// Serve the registry on stdin/stdout until the client disconnects.
pub async fn serve(registry: Arc<CommandRegistry>, timeout: Option<Duration>) -> Result<()> {
    let tools = registry.len();
    let server = McpServer::new(registry, timeout);
    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP server on stdio")?;
    info!(tools, "MCP server ready on stdio");
    let reason = running.waiting().await.context("MCP server task failed")?;
    info!(?reason, "MCP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::register_all;
    use crate::services::build_locator;
    use rmcp::model::RawContent;
    use serde_json::{Value, json};

    fn server() -> McpServer {
        let locator = Arc::new(build_locator(None).unwrap());
        let mut builder = CommandRegistry::builder(locator);
        register_all(&mut builder).unwrap();
        McpServer::new(Arc::new(builder.build()), Some(Duration::from_secs(5)))
    }

    fn envelope(result: &CallToolResult) -> Value {
        match &result.content[0].raw {
            RawContent::Text(t) => serde_json::from_str(&t.text).unwrap(),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn every_command_is_a_tool() {
        let tools = server().tools();
        assert_eq!(tools.len(), 9);
        let names: Vec<_> = tools.iter().map(|t| t.name.to_string()).collect();
        assert!(names.contains(&"appinsights-app-correlate".to_string()));
        let correlate = tools
            .iter()
            .find(|t| t.name == "appinsights-app-correlate")
            .unwrap();
        assert_eq!(correlate.input_schema["required"], json!(["data-sets"]));
        assert_eq!(
            correlate.annotations.as_ref().unwrap().read_only_hint,
            Some(true)
        );
    }

    #[tokio::test]
    async fn validation_failure_is_flagged_as_error() {
        let result = server()
            .invoke(
                "appinsights-app-correlate",
                Some(JsonObject::new()),
                CancellationToken::new(),
                Some("test-client".into()),
            )
            .await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            envelope(&result),
            json!({"status": 400, "message": "Missing Required options: --data-sets"})
        );
    }

    #[tokio::test]
    async fn unconfigured_backend_reports_unavailable() {
        let args = json!({"subscription": "sub"}).as_object().cloned();
        let result = server()
            .invoke(
                "monitor-workspace-list",
                args,
                CancellationToken::new(),
                None,
            )
            .await;
        assert_eq!(envelope(&result)["status"], json!(503));
    }

    #[tokio::test]
    async fn unknown_tool_answers_not_found() {
        let result = server()
            .invoke("storage-account-list", None, CancellationToken::new(), None)
            .await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            envelope(&result)["message"],
            json!("Unknown command: storage-account-list")
        );
    }
}
