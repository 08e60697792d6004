//! Geometry value conversion
//!
//! Every result cell passes through one [`GeometryConverter`] on its way out.
//! The default converter only tags geometry-bearing text; a WKB decoder can
//! replace it without touching row iteration.

use crate::store::ColumnMeta;
use crate::types::Value;

/// Shapes one raw cell, given the metadata of its column
pub trait GeometryConverter: Send + Sync {
    fn convert(&self, value: Value, column: &ColumnMeta) -> Value;
}

/// Leaves every value as it is, marking geometry text as [`Value::Geometry`]
///
/// Geometry text is either already GeoJSON shaped, or the hex EWKB the store
/// produces for `geometry` / `geography` columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonPassthrough;

impl GeometryConverter for GeoJsonPassthrough {
    fn convert(&self, value: Value, column: &ColumnMeta) -> Value {
        match value {
            Value::Text(text) if looks_like_geojson(&text) || is_spatial_type(&column.type_name) => {
                Value::Geometry(text)
            }
            other => other,
        }
    }
}

/// A string starting with `{` that carries a `"type"` key
pub fn looks_like_geojson(text: &str) -> bool {
    text.starts_with('{') && text.contains("\"type\"")
}

/// PostGIS column types
pub fn is_spatial_type(type_name: &str) -> bool {
    type_name.eq_ignore_ascii_case("geometry") || type_name.eq_ignore_ascii_case("geography")
}
