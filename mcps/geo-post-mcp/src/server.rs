//! MCP Server implementation for the PostGIS gateway
//!
//! This module defines the MCP server that exposes the gateway as tools.
//! Handler implementations are in the handlers module.

use mcp_common::{
    async_trait, CallToolResult, EmbeddableError, EmbeddableMcp, EmbeddableResult, McpError,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo, Tool},
    tool, tool_handler, tool_router,
};
use serde_json::Value;

use crate::context::Gateway;
use crate::handlers;
use crate::params::*;

/// The Geo-Post MCP Server
#[derive(Clone)]
pub struct GeoPostMcpServer {
    gateway: Gateway,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Tool Router - Each tool delegates to its handler
// ============================================================================

#[tool_router]
impl GeoPostMcpServer {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Run a read-only SQL query (SELECT or WITH) against allowed tables. \
                       Returns columns, rows, row_count and a truncated flag."
    )]
    async fn query(
        &self,
        Parameters(params): Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::query(&self.gateway, params).await
    }

    #[tool(description = "List allowed tables in the configured schema with estimated row counts")]
    async fn list_tables(&self) -> Result<CallToolResult, McpError> {
        handlers::list_tables(&self.gateway).await
    }

    #[tool(
        description = "Describe the columns of an allowed table, including geometry type, \
                       SRID and coordinate dimension for spatial columns"
    )]
    async fn describe_table(
        &self,
        Parameters(params): Parameters<DescribeTableParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::describe_table(&self.gateway, params).await
    }

    #[tool(description = "Get the documented meaning (column comments) of every column of an allowed table")]
    async fn fieldmeaning(
        &self,
        Parameters(params): Parameters<FieldMeaningParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::fieldmeaning(&self.gateway, params).await
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for GeoPostMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Read-only PostGIS gateway. Query allowed tables with SELECT statements, \
                 list and describe tables, and read column comments. \
                 Geometry values are returned as GeoJSON text or hex EWKB."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Embeddable Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for GeoPostMcpServer {
    fn server_name(&self) -> &str {
        "geo-post"
    }

    fn server_description(&self) -> Option<&str> {
        Some("Read-only PostGIS gateway with table allow-listing and row limits.")
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        match name {
            "query" => {
                let params: QueryParams = serde_json::from_value(params)?;
                self.query(Parameters(params)).await.map_err(Into::into)
            }

            "list_tables" => self.list_tables().await.map_err(Into::into),

            "describe_table" => {
                let params: DescribeTableParams = serde_json::from_value(params)?;
                self.describe_table(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "fieldmeaning" => {
                let params: FieldMeaningParams = serde_json::from_value(params)?;
                self.fieldmeaning(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}
