//! Type definitions for the geo-post gateway

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;
use crate::validator::RejectionReason;

// ============================================================================
// Values
// ============================================================================

/// A single result cell as returned to callers
///
/// Serializes to the plain JSON scalar; `Geometry` is a string on the wire
/// (GeoJSON text or hex EWKB) and only differs from `Text` internally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Geometry(String),
}

impl Value {
    /// Finite floats become numbers; NaN and infinities keep their text form.
    pub fn float(v: f64) -> Self {
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or_else(|| Value::Text(v.to_string()))
    }

    /// Parse a decimal rendering as a number, keeping the text if it won't fit.
    pub fn decimal(text: String) -> Self {
        match text.parse::<serde_json::Number>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(text),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Shaped result of an admitted query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names in store-reported order
    pub columns: Vec<String>,
    /// Rows, each with one value per column
    pub rows: Vec<Vec<Value>>,
    /// Number of rows kept after truncation
    pub row_count: usize,
    /// True iff the store had more rows than the limit
    pub truncated: bool,
}

/// `query` tool payload
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub result: QueryResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One row of `list_tables`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table_name: String,
    pub schema: String,
    pub estimated_rows: i64,
}

/// PostGIS attributes of a geometry column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpatialInfo {
    pub geometry_type: String,
    pub srid: i32,
    #[serde(rename = "coord_dimension")]
    pub coordinate_dimension: i32,
}

/// Column metadata reported by `describe_table`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    #[serde(rename = "column_name")]
    pub name: String,
    pub data_type: String,
    /// Underlying type name; `geometry` where `data_type` is `USER-DEFINED`
    pub udt_name: String,
    pub ordinal_position: i32,
    #[serde(rename = "is_nullable")]
    pub nullable: bool,
    #[serde(rename = "column_default")]
    pub default: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub spatial_info: Option<SpatialInfo>,
}

/// Column comment entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMeaningEntry {
    pub column_name: String,
    pub data_type: String,
    pub ordinal_position: i32,
    pub description: Option<String>,
}

/// `fieldmeaning` tool payload
#[derive(Debug, Serialize)]
pub struct FieldMeaningResponse {
    pub table: String,
    pub schema: String,
    pub columns: Vec<FieldMeaningEntry>,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    AdmissionRejected(#[from] RejectionReason),

    #[error("Access denied: table '{0}' is not in the allowed tables list.")]
    AccessDenied(String),

    #[error("Table '{table}' does not exist in schema '{schema}'.")]
    NotFound { table: String, schema: String },

    #[error("{0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
