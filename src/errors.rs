//! Error types for configuration and code execution

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration and startup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading configuration or building the registry
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown engine: {0}")]
    UnknownEngine(String),
}

/// Boxed inner cause of an internal execution failure
pub type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Why a single execution failed.
///
/// Only [`ExecError::Execution`] is an infrastructure problem. Every other
/// variant is reported to the caller verbatim.
#[derive(Error, Debug)]
pub enum ExecError {
    /// No admission slot was available.
    #[error("busy: try again later")]
    Busy,

    /// A step exceeded its deadline and was killed.
    #[error("code execution timeout")]
    Timeout,

    /// A request argument was rejected.
    #[error("{name}: {reason}")]
    Argument { name: String, reason: String },

    #[error("unknown box {0}")]
    UnknownBox(String),

    /// The sandboxed program exited unsuccessfully.
    #[error("{0}")]
    UserCode(String),

    #[error("host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("parse spec: {0}")]
    Spec(String),

    #[error("http request: {0}")]
    Request(String),

    /// The platform failed, not the code.
    #[error("{context}: {source}")]
    Execution {
        context: &'static str,
        #[source]
        source: Cause,
    },
}

/// Why a request was rejected before execution
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown sandbox")]
    UnknownSandbox,

    #[error("unknown command")]
    UnknownCommand,

    #[error("empty request")]
    EmptyRequest,
}

impl ExecError {
    /// Wrap an infrastructure failure with a short context label
    pub fn execution(context: &'static str, source: impl Into<Cause>) -> Self {
        ExecError::Execution {
            context,
            source: source.into(),
        }
    }

    /// Reject the request argument `name`
    pub fn argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ExecError::Argument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is the platform's fault
    pub fn is_internal(&self) -> bool {
        matches!(self, ExecError::Execution { .. })
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ExecError::Busy)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::Timeout)
    }
}
