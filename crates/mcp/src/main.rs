//! Parcelo MCP Server Binary
//!
//! This is the entry point for running the Parcelo MCP server.
//!
//! ## Usage
//!
//! ```bash
//! # Run with defaults (config from parcelo.toml or config/parcelo.toml)
//! parcelo-mcp
//!
//! # Point at a different logistics backend
//! PARCELO_API_CITIES_URL=https://backend.example/api/city parcelo-mcp
//!
//! # Enable model-backed extraction
//! PARCELO_LLM_ENABLED=true PARCELO_LLM_API_KEY=your-key parcelo-mcp
//! ```

use anyhow::Result;
use tracing::info;

use parcelo_core::config::{AppConfig, LoadOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Parcelo MCP Server");

    let config = AppConfig::load(LoadOptions::default())?;
    let server = parcelo_mcp::ParceloMcpServer::new(config)?;

    // Run MCP server
    server.run_stdio().await?;

    Ok(())
}
