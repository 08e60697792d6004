//! Handler implementations for geo-post-mcp tools
//!
//! Each handler runs the gateway checks in order, calls the core, and turns
//! the outcome into a `CallToolResult` or an MCP error.

use mcp_common::{
    internal_error, invalid_params, invalid_request, json_success, not_found, CallToolResult,
    McpError,
};

use crate::access::is_table_allowed;
use crate::context::Gateway;
use crate::extract::extract_table_names;
use crate::fieldmeaning::{get_field_meanings, table_exists, validate_bare_name};
use crate::introspect;
use crate::params::*;
use crate::shaper::{execute_query, sql_preview};
use crate::types::{
    ColumnDescriptor, FieldMeaningResponse, GatewayError, QueryResponse, QueryResult,
};
use crate::validator::validate_select_only;

/// Convert a GatewayError to the MCP error callers see
fn gateway_error_to_mcp(err: GatewayError) -> McpError {
    match &err {
        GatewayError::AdmissionRejected(_) | GatewayError::InvalidIdentifier(_) => {
            invalid_params(err.to_string())
        }
        GatewayError::AccessDenied(_) => invalid_request(err.to_string()),
        GatewayError::NotFound { .. } => not_found(err.to_string()),
        GatewayError::Store(_) => internal_error(err.to_string()),
    }
}

fn ensure_allowed(gateway: &Gateway, table: &str) -> Result<(), GatewayError> {
    if is_table_allowed(table, &gateway.allow_list) {
        Ok(())
    } else {
        Err(GatewayError::AccessDenied(table.to_string()))
    }
}

async fn ensure_exists(gateway: &Gateway, table: &str) -> Result<(), GatewayError> {
    if table_exists(gateway.store.as_ref(), gateway.schema(), table).await? {
        Ok(())
    } else {
        Err(GatewayError::NotFound {
            table: table.to_string(),
            schema: gateway.schema().to_string(),
        })
    }
}

// ============================================================================
// Query
// ============================================================================

/// Admission, then access control on every referenced table, then execution
async fn run_query(
    gateway: &Gateway,
    sql: &str,
    row_limit: usize,
) -> Result<QueryResult, GatewayError> {
    validate_select_only(sql)?;

    for table in extract_table_names(sql) {
        ensure_allowed(gateway, &table)?;
    }

    Ok(execute_query(
        gateway.store.as_ref(),
        gateway.converter.as_ref(),
        sql,
        row_limit,
    )
    .await?)
}

pub async fn query(gateway: &Gateway, params: QueryParams) -> Result<CallToolResult, McpError> {
    tracing::info!(
        sql = sql_preview(&params.sql),
        row_limit = params.row_limit,
        "query_tool_invoked"
    );

    if params.row_limit < 1 {
        return Err(invalid_params(format!(
            "row_limit must be at least 1, got {}",
            params.row_limit
        )));
    }
    let row_limit = usize::try_from(params.row_limit)
        .unwrap_or(usize::MAX)
        .min(gateway.settings.max_row_limit.max(1));

    let result = run_query(gateway, &params.sql, row_limit)
        .await
        .map_err(gateway_error_to_mcp)?;

    tracing::info!(
        row_count = result.row_count,
        truncated = result.truncated,
        "query_result"
    );

    let message = result
        .truncated
        .then(|| format!("Results truncated to {} rows.", row_limit));

    json_success(&QueryResponse { result, message })
}

// ============================================================================
// Schema Introspection
// ============================================================================

pub async fn list_tables(gateway: &Gateway) -> Result<CallToolResult, McpError> {
    tracing::info!("list_tables_tool_invoked");

    let tables = introspect::list_tables(
        gateway.store.as_ref(),
        gateway.schema(),
        &gateway.allow_list,
    )
    .await
    .map_err(|e| gateway_error_to_mcp(e.into()))?;

    tracing::info!(table_count = tables.len(), "list_tables_result");

    json_success(&tables)
}

async fn describe(
    gateway: &Gateway,
    table: &str,
) -> Result<Vec<ColumnDescriptor>, GatewayError> {
    ensure_allowed(gateway, table)?;
    ensure_exists(gateway, table).await?;
    Ok(introspect::describe_table(gateway.store.as_ref(), gateway.schema(), table).await?)
}

pub async fn describe_table(
    gateway: &Gateway,
    params: DescribeTableParams,
) -> Result<CallToolResult, McpError> {
    tracing::info!(table_name = %params.table_name, "describe_table_tool_invoked");

    let columns = describe(gateway, &params.table_name)
        .await
        .map_err(gateway_error_to_mcp)?;

    tracing::info!(
        table_name = %params.table_name,
        column_count = columns.len(),
        "describe_table_result"
    );

    json_success(&columns)
}

// ============================================================================
// Column Comments
// ============================================================================

async fn field_meanings(
    gateway: &Gateway,
    table: &str,
) -> Result<FieldMeaningResponse, GatewayError> {
    validate_bare_name(table)?;
    ensure_allowed(gateway, table)?;
    ensure_exists(gateway, table).await?;

    let columns = get_field_meanings(gateway.store.as_ref(), gateway.schema(), table).await?;

    Ok(FieldMeaningResponse {
        table: table.to_string(),
        schema: gateway.schema().to_string(),
        columns,
    })
}

pub async fn fieldmeaning(
    gateway: &Gateway,
    params: FieldMeaningParams,
) -> Result<CallToolResult, McpError> {
    tracing::info!(table_name = %params.table_name, "fieldmeaning_tool_invoked");

    let response = field_meanings(gateway, &params.table_name)
        .await
        .map_err(gateway_error_to_mcp)?;

    tracing::info!(
        table_name = %params.table_name,
        column_count = response.columns.len(),
        "fieldmeaning_result"
    );

    json_success(&response)
}
