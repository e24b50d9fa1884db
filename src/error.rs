//! Error types for the MCP tool servers
//!
//! This module defines the error hierarchy shared by the protocol core and
//! the concrete operation catalogs.

use thiserror::Error;

use crate::mcp::schema::FieldKind;

/// Main error type for the MCP tool servers
#[derive(Error, Debug)]
pub enum ToolServerError {
    /// Catalog construction errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while building an operation catalog.
///
/// These indicate a programming defect and abort startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Operation already registered: {name}")]
    DuplicateOperation { name: String },
}

/// Per-invocation failures.
///
/// The `Display` output of each variant is the message rendered into the
/// failure envelope, so wording here is user-visible.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Unknown tool: {name}")]
    UnknownOperation { name: String },

    #[error("Missing required argument: {field}")]
    MissingArgument { field: String },

    #[error("Invalid argument '{field}': expected {expected}")]
    InvalidArgument { field: String, expected: FieldKind },

    #[error("Arguments must be an object")]
    MalformedArguments,

    #[error("Access denied: path not allowed")]
    AccessDenied { path: String },

    #[error("{message}")]
    Domain { message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation timed out after {millis} ms")]
    Timeout { millis: u64 },

    #[error("Operation failed unexpectedly")]
    Panicked,
}

impl InvocationError {
    /// Operation-specific failure with a human-readable message
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with a short description of what was attempted
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Short machine-friendly label used in log events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::MissingArgument { .. } => "missing_argument",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::MalformedArguments => "malformed_arguments",
            Self::AccessDenied { .. } => "access_denied",
            Self::Domain { .. } => "domain_error",
            Self::Io { .. } => "io_error",
            Self::Timeout { .. } => "timeout",
            Self::Panicked => "panicked",
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Working directory is unavailable: {0}")]
    WorkingDirUnavailable(#[source] std::io::Error),

    #[error("Invalid value for {var}: {value}")]
    InvalidEnvVar { var: String, value: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Transport error: {message}")]
    TransportError { message: String },
}

/// Result type alias for tool server operations
pub type Result<T> = std::result::Result<T, ToolServerError>;
