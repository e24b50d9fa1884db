//! MCP Tool Server
//!
//! Runs one of the bundled Model Context Protocol servers over stdio.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use mcp_tool_servers::config::Config;
use mcp_tool_servers::servers::ServerKind;

/// MCP tool server
#[derive(Parser)]
#[command(name = "mcp-tool-server")]
#[command(author, version, about = "Model Context Protocol tool servers over stdio")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Arithmetic operations
    Calculator,
    /// Simulated weather lookup
    Weather,
    /// File operations confined to the working directory
    FileManager,
}

impl From<Commands> for ServerKind {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Calculator => ServerKind::Calculator,
            Commands::Weather => ServerKind::Weather,
            Commands::FileManager => ServerKind::FileManager,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let kind = ServerKind::from(cli.command);

    let config = Config::new().context("failed to load configuration")?;
    tracing::debug!(
        allowed_root = %config.allowed_root.display(),
        timeout_ms = config.invocation_timeout_ms,
        guard_mode = ?config.guard_mode,
        "configuration loaded"
    );

    let server = kind
        .build_server(&config)
        .with_context(|| format!("failed to build {}", kind.name()))?;

    Arc::new(server)
        .run_stdio()
        .await
        .context("stdio transport failed")?;

    Ok(())
}
