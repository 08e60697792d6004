//! Geo-Post MCP - Read-only PostGIS gateway over MCP stdio
//!
//! Settings come from `--settings`, `GEO_POST_MCP_SETTINGS`, or
//! `./geo-post-mcp-settings.json`; the password from `POSTGISMCPPASS`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use geo_post_mcp::{Gateway, GeoPostMcpServer, PgStore, Settings};
use mcp_common::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "geo-post-mcp", version, about = "Read-only PostGIS gateway over MCP")]
struct Cli {
    /// Path to the settings file (JSON, or TOML by extension)
    #[arg(long, env = "GEO_POST_MCP_SETTINGS")]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    mcp_common::init_tracing("geo_post_mcp", LogFormat::Json)?;

    tracing::info!("Starting Geo-Post MCP server");

    let settings = Settings::load(cli.settings.as_deref())?;
    let store = PgStore::connect(&settings).await?;

    let server = GeoPostMcpServer::new(Gateway::new(settings, Arc::new(store.clone())));
    let served = mcp_common::serve_stdio(server).await;

    store.close().await;
    tracing::info!("Database pool closed");

    served
}
