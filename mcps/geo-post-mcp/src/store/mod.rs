//! Backing-store access
//!
//! The gateway core talks to the database only through [`Store`]. The
//! production implementation is [`PgStore`]; tests use an in-memory double.

mod postgres;

#[cfg(test)]
pub(crate) mod memory;

pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ColumnDescriptor, FieldMeaningEntry, SpatialInfo, TableSummary, Value};

/// Name and store type of one result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    /// Type name as the store reports it (`INT4`, `TEXT`, `geometry`, ...)
    pub type_name: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Raw rows of a statement, before shaping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<Value>>,
}

/// Spatial catalog entry for one geometry column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialColumn {
    pub column_name: String,
    pub info: SpatialInfo,
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// Any failure reported by the database or driver, message unchanged
    #[error("{0}")]
    Database(#[source] sqlx::Error),

    /// The statement named a relation that does not exist (SQLSTATE 42P01)
    #[error("{0}")]
    UndefinedRelation(String),

    /// A round-trip outlived the statement timeout and was abandoned
    #[error("Statement cancelled: exceeded the {0}s statement timeout")]
    Timeout(u64),
}

/// SQLSTATE for `undefined_table`
const UNDEFINED_TABLE: &str = "42P01";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(UNDEFINED_TABLE) {
                return StoreError::UndefinedRelation(db.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Read-only operations the gateway needs from the database
///
/// Every method is one logical round-trip; none retries.
#[async_trait]
pub trait Store: Send + Sync {
    /// Run `sql` and return its column metadata plus at most `max_rows` rows.
    async fn fetch(&self, sql: &str, max_rows: usize) -> Result<RowSet, StoreError>;

    /// Base tables of `schema` with estimated live row counts, by name.
    async fn base_tables(&self, schema: &str) -> Result<Vec<TableSummary>, StoreError>;

    /// Column metadata for `table`, in ordinal order, without spatial info.
    async fn columns(&self, schema: &str, table: &str)
        -> Result<Vec<ColumnDescriptor>, StoreError>;

    /// Geometry columns of `table` from the spatial catalog.
    ///
    /// Fails with [`StoreError::UndefinedRelation`] when the catalog itself
    /// is missing (no PostGIS).
    async fn spatial_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<SpatialColumn>, StoreError>;

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, StoreError>;

    /// Columns of `table` joined with their comments, in ordinal order.
    async fn field_meanings(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<FieldMeaningEntry>, StoreError>;
}
