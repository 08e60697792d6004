//! PostgreSQL / PostGIS store over a sqlx pool

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgTypeInfo, PgTypeKind};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{BigDecimal, Uuid};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};

use super::{ColumnMeta, RowSet, SpatialColumn, Store, StoreError};
use crate::config::{self, Settings};
use crate::types::{ColumnDescriptor, FieldMeaningEntry, SpatialInfo, TableSummary, Value};

const LIST_TABLES_QUERY: &str = r#"
SELECT
    t.table_name::text AS table_name,
    t.table_schema::text AS table_schema,
    COALESCE(s.n_live_tup, 0)::int8 AS estimated_rows
FROM information_schema.tables t
LEFT JOIN pg_stat_user_tables s
    ON t.table_schema = s.schemaname
    AND t.table_name = s.relname
WHERE t.table_schema = $1
    AND t.table_type = 'BASE TABLE'
ORDER BY t.table_name
"#;

const DESCRIBE_TABLE_QUERY: &str = r#"
SELECT
    c.column_name::text AS column_name,
    c.data_type::text AS data_type,
    c.udt_name::text AS udt_name,
    c.ordinal_position::int4 AS ordinal_position,
    c.is_nullable::text AS is_nullable,
    c.column_default::text AS column_default
FROM information_schema.columns c
WHERE c.table_schema = $1
    AND c.table_name = $2
ORDER BY c.ordinal_position
"#;

const SPATIAL_COLUMNS_QUERY: &str = r#"
SELECT
    f_geometry_column::text AS column_name,
    type::text AS geometry_type,
    srid::int4 AS srid,
    coord_dimension::int4 AS coord_dimension
FROM geometry_columns
WHERE f_table_schema = $1
    AND f_table_name = $2
"#;

const TABLE_EXISTS_QUERY: &str = r#"
SELECT EXISTS (
    SELECT 1 FROM information_schema.tables
    WHERE table_schema = $1 AND table_name = $2
)
"#;

const FIELD_MEANINGS_QUERY: &str = r#"
SELECT
    c.column_name::text AS column_name,
    c.data_type::text AS data_type,
    c.ordinal_position::int4 AS ordinal_position,
    d.description
FROM information_schema.columns c
LEFT JOIN pg_catalog.pg_statio_all_tables st
    ON c.table_schema = st.schemaname
    AND c.table_name = st.relname
LEFT JOIN pg_catalog.pg_description d
    ON d.objoid = st.relid
    AND d.objsubid = c.ordinal_position
WHERE c.table_schema = $1
    AND c.table_name = $2
ORDER BY c.ordinal_position
"#;

/// Store backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Open a pool from settings; the password comes from the environment.
    pub async fn connect(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.statement_timeout_secs);
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&config::password())
            .database(&settings.dbname)
            .application_name("geo-post-mcp")
            .options([("statement_timeout", timeout.as_millis().to_string())]);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to {}:{}/{} as {}",
                    settings.host, settings.port, settings.dbname, settings.user
                )
            })?;

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            user = %settings.user,
            "database_connected"
        );

        Ok(Self::new(pool, timeout))
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run one round-trip under the statement timeout. On expiry the future
    /// is dropped and nothing it produced is returned. A server-side
    /// cancellation by `statement_timeout` and an exhausted pool wait are
    /// reported the same way.
    async fn bounded<T, F>(&self, round_trip: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let timed_out = || StoreError::Timeout(self.timeout.as_secs());
        match tokio::time::timeout(self.timeout, round_trip).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(sqlx::Error::PoolTimedOut)) => Err(timed_out()),
            Ok(Err(err)) if is_query_canceled(&err) => Err(timed_out()),
            Ok(Err(err)) => Err(StoreError::from(err)),
            Err(_) => Err(timed_out()),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn fetch(&self, sql: &str, max_rows: usize) -> Result<RowSet, StoreError> {
        self.bounded(async {
            let mut conn = self.pool.acquire().await?;
            let statement = (&mut *conn).prepare(sql).await?;

            let columns: Vec<ColumnMeta> = statement
                .columns()
                .iter()
                .map(|c| ColumnMeta::new(c.name(), c.type_info().name()))
                .collect();
            if columns.is_empty() {
                return Ok(RowSet::default());
            }

            let mut rows = Vec::new();
            let mut stream = statement.query().fetch(&mut *conn);
            while rows.len() < max_rows {
                let Some(row) = stream.try_next().await? else {
                    break;
                };
                rows.push(decode_row(&row, &columns)?);
            }
            drop(stream);

            Ok(RowSet { columns, rows })
        })
        .await
    }

    async fn base_tables(&self, schema: &str) -> Result<Vec<TableSummary>, StoreError> {
        let rows = self
            .bounded(sqlx::query(LIST_TABLES_QUERY).bind(schema).fetch_all(&self.pool))
            .await?;

        rows.iter()
            .map(|r| {
                Ok(TableSummary {
                    table_name: r.try_get("table_name")?,
                    schema: r.try_get("table_schema")?,
                    estimated_rows: r.try_get("estimated_rows")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(StoreError::from)
    }

    async fn columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, StoreError> {
        let rows = self
            .bounded(
                sqlx::query(DESCRIBE_TABLE_QUERY)
                    .bind(schema)
                    .bind(table)
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.iter()
            .map(|r| {
                let is_nullable: String = r.try_get("is_nullable")?;
                Ok(ColumnDescriptor {
                    name: r.try_get("column_name")?,
                    data_type: r.try_get("data_type")?,
                    udt_name: r.try_get("udt_name")?,
                    ordinal_position: r.try_get("ordinal_position")?,
                    nullable: is_nullable == "YES",
                    default: r.try_get("column_default")?,
                    spatial_info: None,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(StoreError::from)
    }

    async fn spatial_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<SpatialColumn>, StoreError> {
        let rows = self
            .bounded(
                sqlx::query(SPATIAL_COLUMNS_QUERY)
                    .bind(schema)
                    .bind(table)
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.iter()
            .map(|r| {
                Ok(SpatialColumn {
                    column_name: r.try_get("column_name")?,
                    info: SpatialInfo {
                        geometry_type: r.try_get("geometry_type")?,
                        srid: r.try_get("srid")?,
                        coordinate_dimension: r.try_get("coord_dimension")?,
                    },
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(StoreError::from)
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, StoreError> {
        self.bounded(
            sqlx::query_scalar::<_, bool>(TABLE_EXISTS_QUERY)
                .bind(schema)
                .bind(table)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn field_meanings(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<FieldMeaningEntry>, StoreError> {
        let rows = self
            .bounded(
                sqlx::query(FIELD_MEANINGS_QUERY)
                    .bind(schema)
                    .bind(table)
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.iter()
            .map(|r| {
                Ok(FieldMeaningEntry {
                    column_name: r.try_get("column_name")?,
                    data_type: r.try_get("data_type")?,
                    ordinal_position: r.try_get("ordinal_position")?,
                    description: r.try_get("description")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(StoreError::from)
    }
}

// ============================================================================
// Value decoding
// ============================================================================

/// SQLSTATE raised when `statement_timeout` cancels a statement server-side.
const QUERY_CANCELED: &str = "57014";

/// Types whose binary wire form is their UTF-8 text.
const TEXT_WIRE_TYPES: &[&str] = &["citext", "XML"];

fn is_query_canceled(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(QUERY_CANCELED),
        _ => false,
    }
}

fn decode_row(row: &PgRow, columns: &[ColumnMeta]) -> Result<Vec<Value>, sqlx::Error> {
    (0..columns.len())
        .map(|index| decode_value(row, index))
        .collect()
}

/// Strip domains down to the type whose wire format the value actually uses.
fn base_type(type_info: &PgTypeInfo) -> &PgTypeInfo {
    match type_info.kind() {
        PgTypeKind::Domain(base) => base_type(base),
        _ => type_info,
    }
}

/// Decode one cell by the type the server reports for it.
///
/// Arrays of scalars come out as JSON array text, intervals in Postgres'
/// own output style. Enums and text-like extension types keep their text.
/// Everything else, PostGIS `geometry` / `geography` included, is rendered
/// as lowercase hex of the binary value.
fn decode_value(row: &PgRow, index: usize) -> Result<Value, sqlx::Error> {
    let type_info = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().into_owned()
    };
    let base = base_type(&type_info);

    let value = match base.name() {
        "BOOL" => Value::Bool(row.try_get_unchecked(index)?),
        "INT2" => Value::from(i64::from(row.try_get_unchecked::<i16, _>(index)?)),
        "INT4" => Value::from(i64::from(row.try_get_unchecked::<i32, _>(index)?)),
        "INT8" => Value::from(row.try_get_unchecked::<i64, _>(index)?),
        "FLOAT4" => Value::float(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "FLOAT8" => Value::float(row.try_get_unchecked::<f64, _>(index)?),
        "NUMERIC" => match row.try_get_unchecked::<BigDecimal, _>(index) {
            Ok(n) => Value::decimal(n.to_string()),
            Err(err) => {
                let bytes: Vec<u8> = row.try_get_unchecked(index)?;
                match special_numeric(&bytes) {
                    Some(word) => Value::Text(word.to_string()),
                    None => return Err(err),
                }
            }
        },
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "UNKNOWN" => {
            Value::Text(row.try_get_unchecked(index)?)
        }
        "JSON" | "JSONB" => Value::Text(
            row.try_get_unchecked::<serde_json::Value, _>(index)?
                .to_string(),
        ),
        "UUID" => Value::Text(row.try_get_unchecked::<Uuid, _>(index)?.to_string()),
        "TIMESTAMPTZ" => Value::Text(
            row.try_get_unchecked::<DateTime<Utc>, _>(index)?
                .to_rfc3339(),
        ),
        "TIMESTAMP" => Value::Text(row.try_get_unchecked::<NaiveDateTime, _>(index)?.to_string()),
        "DATE" => Value::Text(row.try_get_unchecked::<NaiveDate, _>(index)?.to_string()),
        "TIME" => Value::Text(row.try_get_unchecked::<NaiveTime, _>(index)?.to_string()),
        "INTERVAL" => Value::Text(format_interval(
            &row.try_get_unchecked::<PgInterval, _>(index)?,
        )),
        "BYTEA" => Value::Text(to_hex(&row.try_get_unchecked::<Vec<u8>, _>(index)?)),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            json_text(&row.try_get_unchecked::<Vec<Option<String>>, _>(index)?)?
        }
        "INT2[]" => json_text(&row.try_get_unchecked::<Vec<Option<i16>>, _>(index)?)?,
        "INT4[]" => json_text(&row.try_get_unchecked::<Vec<Option<i32>>, _>(index)?)?,
        "INT8[]" => json_text(&row.try_get_unchecked::<Vec<Option<i64>>, _>(index)?)?,
        "FLOAT4[]" => json_text(&row.try_get_unchecked::<Vec<Option<f32>>, _>(index)?)?,
        "FLOAT8[]" => json_text(&row.try_get_unchecked::<Vec<Option<f64>>, _>(index)?)?,
        "BOOL[]" => json_text(&row.try_get_unchecked::<Vec<Option<bool>>, _>(index)?)?,
        "NUMERIC[]" => {
            let items: Vec<Option<String>> = row
                .try_get_unchecked::<Vec<Option<BigDecimal>>, _>(index)?
                .into_iter()
                .map(|n| n.map(|n| n.to_string()))
                .collect();
            json_text(&items)?
        }
        "UUID[]" => {
            let items: Vec<Option<String>> = row
                .try_get_unchecked::<Vec<Option<Uuid>>, _>(index)?
                .into_iter()
                .map(|u| u.map(|u| u.to_string()))
                .collect();
            json_text(&items)?
        }
        _ if is_enum_array(base) => {
            json_text(&row.try_get_unchecked::<Vec<Option<String>>, _>(index)?)?
        }
        name => {
            let bytes: Vec<u8> = row.try_get_unchecked(index)?;
            raw_value(bytes, is_text_wire(base.kind(), name))
        }
    };

    Ok(value)
}

fn is_enum_array(type_info: &PgTypeInfo) -> bool {
    match type_info.kind() {
        PgTypeKind::Array(element) => matches!(base_type(element).kind(), PgTypeKind::Enum(_)),
        _ => false,
    }
}

fn is_text_wire(kind: &PgTypeKind, name: &str) -> bool {
    matches!(kind, PgTypeKind::Enum(_))
        || TEXT_WIRE_TYPES.iter().any(|t| t.eq_ignore_ascii_case(name))
}

/// Render undecoded wire bytes: as text only when the type is known to
/// send text, hex otherwise.
fn raw_value(bytes: Vec<u8>, text_wire: bool) -> Value {
    if !text_wire {
        return Value::Text(to_hex(&bytes));
    }
    match String::from_utf8(bytes) {
        Ok(text) => Value::Text(text),
        Err(err) => Value::Text(to_hex(err.as_bytes())),
    }
}

fn json_text<T: serde::Serialize>(items: &T) -> Result<Value, sqlx::Error> {
    serde_json::to_string(items)
        .map(Value::Text)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// NaN and the infinities have no BigDecimal form. The binary numeric
/// header is `ndigits, weight, sign, dscale`; these values live in `sign`.
fn special_numeric(bytes: &[u8]) -> Option<&'static str> {
    match bytes.get(4..6)? {
        [0xC0, 0x00] => Some("NaN"),
        [0xD0, 0x00] => Some("Infinity"),
        [0xF0, 0x00] => Some("-Infinity"),
        _ => None,
    }
}

/// Format an interval the way Postgres prints it with `IntervalStyle = postgres`.
fn format_interval(interval: &PgInterval) -> String {
    fn unit(n: i64, singular: &str, plural: &str) -> String {
        format!("{} {}", n, if n == 1 { singular } else { plural })
    }

    let mut parts = Vec::new();
    let years = i64::from(interval.months / 12);
    let months = i64::from(interval.months % 12);
    if years != 0 {
        parts.push(unit(years, "year", "years"));
    }
    if months != 0 {
        parts.push(unit(months, "mon", "mons"));
    }
    if interval.days != 0 {
        parts.push(unit(i64::from(interval.days), "day", "days"));
    }

    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let total = interval.microseconds.unsigned_abs();
        let hours = total / 3_600_000_000;
        let minutes = total / 60_000_000 % 60;
        let seconds = total / 1_000_000 % 60;
        let micros = total % 1_000_000;

        let mut time = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
        if micros != 0 {
            let fraction = format!("{micros:06}");
            time.push('.');
            time.push_str(fraction.trim_end_matches('0'));
        }
        parts.push(time);
    }

    parts.join(" ")
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
