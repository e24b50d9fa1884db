//! MCP (Model Context Protocol) module
//!
//! The protocol core shared by every server: operation catalog, argument
//! validation, path sandboxing, dispatch and the stdio transport.

pub mod dispatch;
pub mod guard;
pub mod registry;
pub mod schema;
pub mod server;
pub mod types;
pub mod validate;

pub use dispatch::{Dispatcher, InvocationResult};
pub use guard::{AllowedRootSet, GuardMode};
pub use registry::{OperationDefinition, OperationRegistry};
pub use schema::{FieldKind, InputSchema};
pub use server::McpServer;
pub use validate::Arguments;
