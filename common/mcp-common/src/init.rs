//! Server initialization utilities
//!
//! Tracing setup and the stdio serving loop shared by MCP servers.
//! All log output goes to stderr; stdout is reserved for the MCP protocol.

use std::str::FromStr;

use rmcp::{transport::stdio, ServerHandler, ServiceExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines without ANSI colors
    Text,
    /// One JSON object per event, for log aggregation
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else if s.eq_ignore_ascii_case("text") {
            Ok(Self::Text)
        } else {
            Err(format!("unknown log format '{}', expected 'json' or 'text'", s))
        }
    }
}

impl LogFormat {
    /// Resolve the format from `LOG_FORMAT`, falling back to `default`
    /// when the variable is unset or unrecognised.
    pub fn from_env_or(default: LogFormat) -> LogFormat {
        std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

/// Initialize tracing/logging for MCP servers
///
/// - Filtering via `RUST_LOG`, with `<crate_name>=info` added as a default
/// - `LOG_FORMAT=json|text` overrides `default_format`
///
/// Can only be called once per process.
pub fn init_tracing(crate_name: &str, default_format: LogFormat) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::from_env_or(default_format) {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?,
    }

    Ok(())
}

/// Serve `server` over stdio until the client disconnects
///
/// Owned resources held by the server are released when this returns,
/// so callers can run their own shutdown steps afterwards.
pub async fn serve_stdio<S>(server: S) -> anyhow::Result<()>
where
    S: ServerHandler,
{
    let service = server.serve(stdio()).await?;

    tracing::info!("Server running, waiting for requests...");

    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}
