//! Query execution and result shaping

use std::time::Instant;

use crate::geometry::GeometryConverter;
use crate::store::{RowSet, Store, StoreError};
use crate::types::QueryResult;

/// Characters of SQL kept in the per-call log record
const SQL_PREVIEW_CHARS: usize = 200;

/// Run an admitted statement and shape at most `row_limit` rows.
///
/// One extra row is requested so truncation can be detected. Store errors
/// are returned unchanged.
pub async fn execute_query(
    store: &dyn Store,
    converter: &dyn GeometryConverter,
    sql: &str,
    row_limit: usize,
) -> Result<QueryResult, StoreError> {
    let started = Instant::now();
    let RowSet { columns, mut rows } = store.fetch(sql, row_limit.saturating_add(1)).await?;

    let result = if columns.is_empty() {
        QueryResult::default()
    } else {
        let truncated = rows.len() > row_limit;
        rows.truncate(row_limit);

        let rows: Vec<_> = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&columns)
                    .map(|(value, column)| converter.convert(value, column))
                    .collect()
            })
            .collect();

        QueryResult {
            columns: columns.into_iter().map(|c| c.name).collect(),
            row_count: rows.len(),
            rows,
            truncated,
        }
    };

    tracing::info!(
        sql = sql_preview(sql),
        row_count = result.row_count,
        truncated = result.truncated,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "query_executed"
    );

    Ok(result)
}

/// Leading part of `sql`, cut on a character boundary
pub(crate) fn sql_preview(sql: &str) -> &str {
    match sql.char_indices().nth(SQL_PREVIEW_CHARS) {
        Some((end, _)) => &sql[..end],
        None => sql,
    }
}
