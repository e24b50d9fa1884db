//! Configuration management for the MCP tool servers
//!
//! Handles environment variables and the startup working directory.

use std::path::PathBuf;
use std::time::Duration;

use validator::Validate;

use crate::error::{ConfigError, Result};
use crate::mcp::guard::{AllowedRootSet, GuardMode};

/// Environment variable holding the per-invocation timeout in milliseconds
pub const TIMEOUT_ENV: &str = "MCP_INVOCATION_TIMEOUT_MS";

/// Environment variable selecting symlink-resolving path checks
pub const RESOLVE_SYMLINKS_ENV: &str = "MCP_FS_RESOLVE_SYMLINKS";

/// Default per-invocation timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration shared by all server kinds
#[derive(Debug, Clone, Validate)]
pub struct Config {
    /// Working directory at startup; the only allowed root
    pub allowed_root: PathBuf,

    /// Per-invocation timeout in milliseconds, `0` disables it
    #[validate(range(max = 600000))]
    pub invocation_timeout_ms: u64,

    /// How guarded paths are resolved
    pub guard_mode: GuardMode,
}

impl Config {
    /// Create a configuration from the environment
    pub fn new() -> Result<Self> {
        let allowed_root = std::env::current_dir().map_err(ConfigError::WorkingDirUnavailable)?;

        let invocation_timeout_ms = match std::env::var(TIMEOUT_ENV) {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };

        let guard_mode = match std::env::var(RESOLVE_SYMLINKS_ENV) {
            Ok(raw) => parse_guard_mode(&raw)?,
            Err(_) => GuardMode::default(),
        };

        Self::from_parts(allowed_root, invocation_timeout_ms, guard_mode)
    }

    /// Assemble and validate a configuration from explicit values
    pub fn from_parts(
        allowed_root: PathBuf,
        invocation_timeout_ms: u64,
        guard_mode: GuardMode,
    ) -> Result<Self> {
        let config = Self {
            allowed_root,
            invocation_timeout_ms,
            guard_mode,
        };

        config.validate().map_err(|e| ConfigError::InvalidConfig {
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Timeout applied by the dispatcher, if enabled
    pub fn invocation_timeout(&self) -> Option<Duration> {
        (self.invocation_timeout_ms > 0).then(|| Duration::from_millis(self.invocation_timeout_ms))
    }

    /// Root set handed to servers with guarded operations
    pub fn allowed_roots(&self) -> AllowedRootSet {
        AllowedRootSet::new(
            self.allowed_root.clone(),
            [self.allowed_root.clone()],
            self.guard_mode,
        )
    }
}

fn parse_timeout(raw: &str) -> std::result::Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnvVar {
        var: TIMEOUT_ENV.to_string(),
        value: raw.to_string(),
    })
}

fn parse_guard_mode(raw: &str) -> std::result::Result<GuardMode, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(GuardMode::ResolveSymlinks),
        "0" | "false" | "no" | "" => Ok(GuardMode::Lexical),
        _ => Err(ConfigError::InvalidEnvVar {
            var: RESOLVE_SYMLINKS_ENV.to_string(),
            value: raw.to_string(),
        }),
    }
}
