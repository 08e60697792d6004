//! Schema introspection: allowed tables and column metadata

use std::collections::HashMap;

use crate::access::{is_table_allowed, AllowList};
use crate::store::{Store, StoreError};
use crate::types::{ColumnDescriptor, TableSummary};

/// Base tables of `schema` that are on the allow-list.
///
/// The store returns every base table; filtering happens here.
pub async fn list_tables(
    store: &dyn Store,
    schema: &str,
    allowed: &AllowList,
) -> Result<Vec<TableSummary>, StoreError> {
    let tables = store.base_tables(schema).await?;
    Ok(tables
        .into_iter()
        .filter(|t| is_table_allowed(&t.table_name, allowed))
        .collect())
}

/// Columns of `table` in ordinal order, with spatial attributes merged in.
///
/// Callers check the allow-list and existence first. A database without a
/// spatial catalog simply has no geometry columns.
pub async fn describe_table(
    store: &dyn Store,
    schema: &str,
    table: &str,
) -> Result<Vec<ColumnDescriptor>, StoreError> {
    let mut columns = store.columns(schema, table).await?;

    let spatial = match store.spatial_columns(schema, table).await {
        Ok(spatial) => spatial,
        Err(StoreError::UndefinedRelation(message)) => {
            tracing::debug!(%message, "Spatial catalog unavailable");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let mut by_name: HashMap<String, _> = spatial
        .into_iter()
        .map(|s| (s.column_name, s.info))
        .collect();

    for column in &mut columns {
        if let Some(info) = by_name.remove(&column.name) {
            column.spatial_info = Some(info);
        }
    }

    Ok(columns)
}
