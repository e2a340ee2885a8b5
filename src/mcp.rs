//! MCP JSON-RPC protocol bridge.
//!
//! Exposes the [`ToolRegistry`] as MCP tools via `list_tools` / `call_tool`.
//! The same bridge is served over stdio and over Streamable HTTP (see
//! [`crate::server`]).
//!
//! A tool that returns `Err` (only `fetch_and_save_posts` does) becomes a
//! failed call result with the error text; query tools always succeed and
//! carry any reported problem inside their JSON.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler};

use crate::tools::{ToolContext, ToolRegistry};

/// Bridges the tool registry to the MCP JSON-RPC protocol.
///
/// Each MCP session receives a clone of this struct; the registry and
/// context are shared.
#[derive(Clone)]
pub struct McpBridge {
    ctx: ToolContext,
    tools: Arc<ToolRegistry>,
}

impl McpBridge {
    pub fn new(ctx: ToolContext, tools: Arc<ToolRegistry>) -> Self {
        Self { ctx, tools }
    }

    /// Convert a tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn crate::tools::Tool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match tool.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(tool.read_only())),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    /// Render a tool's JSON output as MCP text content.
    ///
    /// Plain strings (the fetch confirmation) are sent as-is; everything
    /// else is pretty-printed JSON.
    fn to_content(value: &serde_json::Value) -> Content {
        match value {
            serde_json::Value::String(s) => Content::text(s.clone()),
            other => Content::text(serde_json::to_string_pretty(other).unwrap_or_default()),
        }
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "post-harness".to_string(),
                title: Some("LinkedIn Profile Analyzer".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Fetch a profile's posts once with fetch_and_save_posts, then explore them \
                 with get_saved_posts (pagination), search_posts (keyword), get_top_posts \
                 (ranking by 'Like Count' or 'Total Reactions') and get_posts_by_date \
                 (YYYY-MM-DD range). Query results hold at most 5 posts; check has_more."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(&request.name, request.arguments).await
    }
}

impl McpBridge {
    /// Run a named tool. Unknown names are a protocol error; a tool `Err`
    /// is a failed call result.
    async fn dispatch(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", name),
                None,
            )
        })?;

        let params = arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        tracing::debug!(tool = %name, "mcp tool call");
        match tool.execute(params, &self.ctx).await {
            Ok(result) => Ok(CallToolResult::success(vec![Self::to_content(&result)])),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "tool call failed");
                Ok(CallToolResult::error(vec![Content::text(format!("{:#}", e))]))
            }
        }
    }
}
