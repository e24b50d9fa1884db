//! MCP Tool Servers Library
//!
//! Small Model Context Protocol servers (calculator, weather, file manager)
//! built on a shared core: operation registry, argument validation, path
//! sandboxing and a dispatcher that turns every outcome into a result envelope.

pub mod config;
pub mod error;
pub mod mcp;
pub mod servers;

pub use config::Config;
pub use error::{Result, ToolServerError};
pub use servers::ServerKind;
