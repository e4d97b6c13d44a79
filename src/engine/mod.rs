//! Code execution engines
//!
//! An engine executes one specific command of one sandbox. Engines are built
//! once from configuration and shared by every request thread, so they must
//! be safe for concurrent use.
//!
//! Two kinds exist:
//!
//! - [`Docker`] runs a pipeline of steps in containers via the container CLI
//! - [`Http`] performs an outbound HTTP request described by the input file

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::{Error, ExecError, Result};
use crate::execution::Runner;
use crate::utils;

pub mod docker;
pub mod http;

pub use docker::Docker;
pub use http::Http;

/// Stderr shown to the caller for internal failures
pub const INTERNAL_ERROR: &str = "internal error";

/// Files of a request by name. An empty name denotes the entry file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Files(BTreeMap<String, String>);

impl Files {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.0.insert(name.into(), content.into());
    }

    /// Content of the first file in name order (the entry file if present)
    pub fn first(&self) -> &str {
        self.0.values().next().map(String::as_str).unwrap_or("")
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Files {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Files(iter.into_iter().collect())
    }
}

/// A code execution request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: String,
    pub sandbox: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub command: String,
    #[serde(default)]
    pub files: Files,
}

impl Request {
    /// Set a unique id: `<sandbox>[.<version>]_<command>_<random>`
    pub fn generate_id(&mut self) {
        let suffix = utils::rand_string(8);
        self.id = if self.version.is_empty() {
            format!("{}_{}_{}", self.sandbox, self.command, suffix)
        } else {
            format!(
                "{}.{}_{}_{}",
                self.sandbox, self.version, self.command, suffix
            )
        };
    }
}

/// Result of a code execution
#[derive(Debug, Default, Serialize)]
pub struct Execution {
    pub id: String,
    pub ok: bool,
    /// Elapsed time in milliseconds
    pub duration: u64,
    pub stdout: String,
    pub stderr: String,
    /// Failure classification, set whenever `ok` is false
    #[serde(skip)]
    pub error: Option<ExecError>,
}

impl Execution {
    /// A successful execution
    pub fn success(id: &str, stdout: String, stderr: String) -> Self {
        Execution {
            id: id.to_string(),
            ok: true,
            stdout,
            stderr,
            ..Default::default()
        }
    }
}

/// Build a failed execution from an error.
///
/// Internal failures are hidden from the caller behind a generic message.
pub fn fail(id: &str, err: ExecError) -> Execution {
    let stderr = if err.is_internal() {
        log::error!("{}: {}", id, err);
        INTERNAL_ERROR.to_string()
    } else {
        err.to_string()
    };
    Execution {
        id: id.to_string(),
        ok: false,
        stderr,
        error: Some(err),
        ..Default::default()
    }
}

/// Executes a specific sandbox command
pub trait Engine: Send + Sync {
    fn exec(&self, req: &Request) -> Execution;
}

/// Declared engine kind of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Docker,
    Http,
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "docker" => Ok(EngineKind::Docker),
            "http" => Ok(EngineKind::Http),
            other => Err(Error::UnknownEngine(other.to_string())),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Docker => f.write_str("docker"),
            EngineKind::Http => f.write_str("http"),
        }
    }
}

/// An engine of any kind
pub enum AnyEngine {
    Docker(Docker),
    Http(Http),
}

impl AnyEngine {
    /// Build the engine for `sandbox`/`command` as declared in `cfg`
    pub fn new(
        cfg: &Arc<Config>,
        sandbox: &str,
        command: &str,
        runner: Arc<dyn Runner>,
    ) -> Result<Self> {
        let cmd = cfg.command(sandbox, command).ok_or_else(|| {
            Error::InvalidConfig(format!("{} {}: command not found", sandbox, command))
        })?;
        let kind: EngineKind = cmd.engine.parse()?;
        match kind {
            EngineKind::Docker => Ok(AnyEngine::Docker(Docker::new(
                Arc::clone(cfg),
                sandbox,
                command,
                runner,
            )?)),
            EngineKind::Http => Ok(AnyEngine::Http(Http::new(cfg, sandbox, command)?)),
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            AnyEngine::Docker(_) => EngineKind::Docker,
            AnyEngine::Http(_) => EngineKind::Http,
        }
    }
}

impl Engine for AnyEngine {
    fn exec(&self, req: &Request) -> Execution {
        match self {
            AnyEngine::Docker(e) => e.exec(req),
            AnyEngine::Http(e) => e.exec(req),
        }
    }
}
