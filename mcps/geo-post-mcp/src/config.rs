//! Configuration for geo-post MCP server

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::access::AllowList;

/// Settings file looked up in the working directory when no path is given
pub const SETTINGS_FILE_NAME: &str = "geo-post-mcp-settings.json";

/// Environment variable holding the database password
pub const PASSWORD_ENV_VAR: &str = "POSTGISMCPPASS";

const KNOWN_FIELDS: [&str; 9] = [
    "host",
    "port",
    "user",
    "dbname",
    "schema",
    "allowed_tables",
    "statement_timeout_secs",
    "max_row_limit",
    "max_connections",
];

/// Database and server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub dbname: String,

    /// Schema all tools operate in
    /// Default: public
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Tables callers may read; empty denies everything
    #[serde(default)]
    pub allowed_tables: Vec<String>,

    /// Per round-trip timeout, enforced client side and as the session's
    /// `statement_timeout`
    /// Default: 30
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,

    /// Upper bound applied to a caller's `row_limit`
    /// Default: 10000
    #[serde(default = "default_max_row_limit")]
    pub max_row_limit: usize,

    /// Pool size
    /// Default: 5
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_statement_timeout() -> u64 {
    30
}

fn default_max_row_limit() -> usize {
    10_000
}

fn default_max_connections() -> u32 {
    5
}

impl Settings {
    /// Load settings from `path`, or from [`SETTINGS_FILE_NAME`] in the
    /// current directory.
    ///
    /// `.toml` files are parsed as TOML, anything else as JSON. Unknown
    /// top-level keys are logged and ignored.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME));

        if !path.exists() {
            let shown = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
            bail!(
                "Settings file not found: {}. Expected file named '{}'.",
                shown.display(),
                SETTINGS_FILE_NAME
            );
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let settings = if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
        .with_context(|| format!("Failed to parse settings from {:?}", path))?;

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            user = %settings.user,
            dbname = %settings.dbname,
            schema = %settings.schema,
            allowed_tables = ?settings.allowed_tables,
            "Settings loaded"
        );

        Ok(settings)
    }

    fn from_json(content: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(content)?;
        if let Some(object) = raw.as_object() {
            warn_unknown_fields(object.keys().map(String::as_str));
        }
        Ok(serde_json::from_value(raw)?)
    }

    fn from_toml(content: &str) -> Result<Self> {
        let raw: toml::Table = toml::from_str(content)?;
        warn_unknown_fields(raw.keys().map(String::as_str));
        Ok(toml::Value::Table(raw).try_into()?)
    }

    /// The allow-list, fixed for the lifetime of the process
    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.allowed_tables.iter().cloned())
    }
}

fn warn_unknown_fields<'a>(keys: impl Iterator<Item = &'a str>) {
    for key in keys.filter(|k| !KNOWN_FIELDS.contains(k)) {
        tracing::warn!("Unrecognized field in settings file: {}", key);
    }
}

/// Database password from [`PASSWORD_ENV_VAR`], empty when unset
pub fn password() -> String {
    std::env::var(PASSWORD_ENV_VAR).unwrap_or_default()
}
