//! Parameter definitions for geo-post-mcp tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default number of rows returned by `query`
pub const DEFAULT_ROW_LIMIT: i64 = 1000;

fn default_row_limit() -> i64 {
    DEFAULT_ROW_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    #[schemars(description = "A read-only SQL statement starting with SELECT or WITH")]
    pub sql: String,

    #[schemars(description = "Maximum number of rows to return (default: 1000)")]
    #[serde(default = "default_row_limit")]
    pub row_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DescribeTableParams {
    #[schemars(description = "Name of an allowed table in the configured schema")]
    pub table_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldMeaningParams {
    #[schemars(description = "Bare table name, without a schema prefix")]
    pub table_name: String,
}
