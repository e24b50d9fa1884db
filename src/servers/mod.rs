//! Concrete operation catalogs
//!
//! Each server kind is an independent process exposing one catalog.

pub mod calculator;
pub mod file_manager;
pub mod weather;

use crate::config::Config;
use crate::error::Result;
use crate::mcp::dispatch::Dispatcher;
use crate::mcp::registry::OperationRegistry;
use crate::mcp::server::McpServer;
use crate::mcp::types::ServerInfo;

/// The server kinds this crate can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    Calculator,
    Weather,
    FileManager,
}

impl ServerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ServerKind::Calculator => calculator::SERVER_NAME,
            ServerKind::Weather => weather::SERVER_NAME,
            ServerKind::FileManager => file_manager::SERVER_NAME,
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            ServerKind::Calculator => calculator::SERVER_VERSION,
            ServerKind::Weather => weather::SERVER_VERSION,
            ServerKind::FileManager => file_manager::SERVER_VERSION,
        }
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name().to_string(),
            version: self.version().to_string(),
        }
    }

    /// Build this kind's catalog
    pub fn registry(&self) -> Result<OperationRegistry> {
        let registry = match self {
            ServerKind::Calculator => calculator::registry()?,
            ServerKind::Weather => weather::registry()?,
            ServerKind::FileManager => file_manager::registry()?,
        };
        Ok(registry)
    }

    /// Dispatcher wired with the configured timeout and, for servers that
    /// touch the filesystem, the allowed roots
    pub fn build_dispatcher(&self, config: &Config) -> Result<Dispatcher> {
        let dispatcher =
            Dispatcher::new(self.registry()?).with_timeout(config.invocation_timeout());

        Ok(match self {
            ServerKind::FileManager => dispatcher.with_allowed_roots(config.allowed_roots()),
            _ => dispatcher,
        })
    }

    /// Fully wired MCP server
    pub fn build_server(&self, config: &Config) -> Result<McpServer> {
        Ok(McpServer::new(self.server_info(), self.build_dispatcher(config)?))
    }
}
