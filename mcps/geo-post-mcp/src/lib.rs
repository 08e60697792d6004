//! Geo-Post MCP Library
//!
//! Read-only gateway to a PostGIS database: SELECT-only admission, table
//! allow-listing, row limits, and schema / column-comment introspection.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use geo_post_mcp::{Gateway, GeoPostMcpServer, PgStore, Settings};
//!
//! let settings = Settings::load(None)?;
//! let store = PgStore::connect(&settings).await?;
//! let server = GeoPostMcpServer::new(Gateway::new(settings, Arc::new(store)));
//! ```
//!
//! - SQL admission and table extraction are lexical, not a parser
//! - Only bare table names in the configured schema are reachable
//! - The database password is read from `POSTGISMCPPASS`

pub mod access;
pub mod config;
pub mod context;
pub mod extract;
pub mod fieldmeaning;
pub mod geometry;
pub mod handlers;
pub mod introspect;
pub mod params;
pub mod server;
pub mod shaper;
pub mod store;
#[cfg(test)]
mod tests;
pub mod types;
pub mod validator;

// Re-export main server type
pub use server::GeoPostMcpServer;

pub use access::AllowList;
pub use config::Settings;
pub use context::Gateway;
pub use geometry::{GeoJsonPassthrough, GeometryConverter};
pub use store::{PgStore, Store, StoreError};
pub use types::GatewayError;

// Re-export parameter types for direct API usage
pub use params::*;
