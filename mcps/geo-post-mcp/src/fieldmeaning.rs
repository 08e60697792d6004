//! Column comments for a single table

use crate::store::{Store, StoreError};
use crate::types::{FieldMeaningEntry, GatewayError};

/// Accept only a non-empty, unqualified table name.
pub fn validate_bare_name(table_name: &str) -> Result<(), GatewayError> {
    if table_name.is_empty() {
        return Err(GatewayError::InvalidIdentifier(
            "Table name must not be empty.".to_string(),
        ));
    }
    if table_name.contains('.') {
        return Err(GatewayError::InvalidIdentifier(format!(
            "Schema-qualified names are not supported. Use bare table name instead of '{}'.",
            table_name
        )));
    }
    Ok(())
}

pub async fn table_exists(store: &dyn Store, schema: &str, table: &str) -> Result<bool, StoreError> {
    store.table_exists(schema, table).await
}

/// Every column of `table` with its comment, by ordinal position.
pub async fn get_field_meanings(
    store: &dyn Store,
    schema: &str,
    table: &str,
) -> Result<Vec<FieldMeaningEntry>, StoreError> {
    let mut entries = store.field_meanings(schema, table).await?;
    entries.sort_by_key(|e| e.ordinal_position);
    Ok(entries)
}
