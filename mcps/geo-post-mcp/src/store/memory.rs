//! In-memory [`Store`] for tests
//!
//! Tables are keyed by schema and name. `fetch` resolves the first table the
//! statement reads from and returns its rows; a statement that reads no table
//! yields one `?column?` row, like `SELECT 1`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ColumnMeta, RowSet, SpatialColumn, Store, StoreError};
use crate::extract::extract_table_names;
use crate::types::{ColumnDescriptor, FieldMeaningEntry, SpatialInfo, TableSummary, Value};

#[derive(Debug, Clone)]
pub(crate) struct MemoryTable {
    schema: String,
    name: String,
    columns: Vec<ColumnDescriptor>,
    column_types: Vec<String>,
    spatial: Vec<SpatialColumn>,
    comments: HashMap<String, String>,
    rows: Vec<Vec<Value>>,
    estimated_rows: i64,
}

impl MemoryTable {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            columns: Vec::new(),
            column_types: Vec::new(),
            spatial: Vec::new(),
            comments: HashMap::new(),
            rows: Vec::new(),
            estimated_rows: 0,
        }
    }

    /// Add a column; `udt_name` doubles as the type name `fetch` reports.
    pub fn column(mut self, name: &str, data_type: &str, udt_name: &str, nullable: bool) -> Self {
        self.columns.push(ColumnDescriptor {
            name: name.to_string(),
            data_type: data_type.to_string(),
            udt_name: udt_name.to_string(),
            ordinal_position: self.columns.len() as i32 + 1,
            nullable,
            default: None,
            spatial_info: None,
        });
        self.column_types.push(udt_name.to_string());
        self
    }

    pub fn default_value(mut self, column: &str, default: &str) -> Self {
        if let Some(c) = self.columns.iter_mut().find(|c| c.name == column) {
            c.default = Some(default.to_string());
        }
        self
    }

    /// Add a `geometry` column registered in the spatial catalog.
    pub fn geometry(mut self, name: &str, geometry_type: &str, srid: i32) -> Self {
        self = self.column(name, "USER-DEFINED", "geometry", true);
        self.spatial.push(SpatialColumn {
            column_name: name.to_string(),
            info: SpatialInfo {
                geometry_type: geometry_type.to_string(),
                srid,
                coordinate_dimension: 2,
            },
        });
        self
    }

    pub fn comment(mut self, column: &str, text: &str) -> Self {
        self.comments.insert(column.to_string(), text.to_string());
        self
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self.estimated_rows = self.rows.len() as i64;
        self
    }

    pub fn estimated_rows(mut self, count: i64) -> Self {
        self.estimated_rows = count;
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    tables: Vec<MemoryTable>,
    no_spatial_catalog: bool,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: MemoryTable) -> Self {
        self.tables.push(table);
        self
    }

    /// Behave like a database without PostGIS installed.
    pub fn without_spatial_catalog(mut self) -> Self {
        self.no_spatial_catalog = true;
        self
    }

    /// Fail every call with a database error carrying `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Number of store calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(StoreError::Database(sqlx::Error::Protocol(message.clone()))),
            None => Ok(()),
        }
    }

    fn table(&self, schema: &str, name: &str) -> Option<&MemoryTable> {
        self.tables
            .iter()
            .find(|t| t.schema == schema && t.name == name)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch(&self, sql: &str, max_rows: usize) -> Result<RowSet, StoreError> {
        self.enter()?;

        let Some(name) = extract_table_names(sql).into_iter().next() else {
            return Ok(RowSet {
                columns: vec![ColumnMeta::new("?column?", "INT4")],
                rows: vec![vec![Value::from(1)]],
            });
        };

        let table = self
            .tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| {
                StoreError::UndefinedRelation(format!("relation \"{}\" does not exist", name))
            })?;

        let columns = table
            .columns
            .iter()
            .zip(&table.column_types)
            .map(|(c, type_name)| ColumnMeta::new(&c.name, type_name))
            .collect();
        let rows = table.rows.iter().take(max_rows).cloned().collect();

        Ok(RowSet { columns, rows })
    }

    async fn base_tables(&self, schema: &str) -> Result<Vec<TableSummary>, StoreError> {
        self.enter()?;

        let mut tables: Vec<TableSummary> = self
            .tables
            .iter()
            .filter(|t| t.schema == schema)
            .map(|t| TableSummary {
                table_name: t.name.clone(),
                schema: t.schema.clone(),
                estimated_rows: t.estimated_rows,
            })
            .collect();
        tables.sort_by(|a, b| a.table_name.cmp(&b.table_name));
        Ok(tables)
    }

    async fn columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, StoreError> {
        self.enter()?;
        Ok(self
            .table(schema, table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn spatial_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<SpatialColumn>, StoreError> {
        self.enter()?;
        if self.no_spatial_catalog {
            return Err(StoreError::UndefinedRelation(
                "relation \"geometry_columns\" does not exist".to_string(),
            ));
        }
        Ok(self
            .table(schema, table)
            .map(|t| t.spatial.clone())
            .unwrap_or_default())
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, StoreError> {
        self.enter()?;
        Ok(self.table(schema, table).is_some())
    }

    async fn field_meanings(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<FieldMeaningEntry>, StoreError> {
        self.enter()?;
        let Some(t) = self.table(schema, table) else {
            return Ok(Vec::new());
        };
        Ok(t.columns
            .iter()
            .map(|c| FieldMeaningEntry {
                column_name: c.name.clone(),
                data_type: c.data_type.clone(),
                ordinal_position: c.ordinal_position,
                description: t.comments.get(&c.name).cloned(),
            })
            .collect())
    }
}
