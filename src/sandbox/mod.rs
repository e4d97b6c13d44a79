//! Sandbox registry: engines by sandbox and command behind the admission gate
//!
//! The registry is built once from configuration and then only read, so a
//! single instance is shared by every request.

use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{CommandConfig, Config};
use crate::engine::{fail, AnyEngine, Engine, Execution, Request};
use crate::errors::{Error, ExecError, Result, ValidationError};
use crate::execution::Runner;

pub mod semaphore;

pub use semaphore::{Permit, Semaphore};

/// Engines for every configured command, plus the admission gate
pub struct Registry {
    semaphore: Semaphore,
    engines: HashMap<String, HashMap<String, AnyEngine>>,
}

impl Registry {
    /// Build an engine for every command of every sandbox
    pub fn from_config(cfg: Config, runner: Arc<dyn Runner>) -> Result<Self> {
        if cfg.pool_size == 0 {
            return Err(Error::InvalidConfig("pool_size must be positive".to_string()));
        }
        let cfg = Arc::new(cfg);
        let mut engines = HashMap::new();
        for (sandbox, commands) in &cfg.commands {
            let mut built = HashMap::new();
            for (name, cmd) in commands {
                validate_command(sandbox, name, cmd)?;
                let engine = AnyEngine::new(&cfg, sandbox, name, Arc::clone(&runner))?;
                built.insert(name.clone(), engine);
            }
            engines.insert(sandbox.clone(), built);
        }
        info!(
            "registry: {} sandboxes, {} workers",
            engines.len(),
            cfg.pool_size
        );
        Ok(Self {
            semaphore: Semaphore::new(cfg.pool_size),
            engines,
        })
    }

    pub fn semaphore(&self) -> &Semaphore {
        &self.semaphore
    }

    /// Check that the sandbox and command exist and the request has code
    pub fn validate(&self, req: &Request) -> std::result::Result<(), ValidationError> {
        let commands = self
            .engines
            .get(&req.sandbox)
            .ok_or(ValidationError::UnknownSandbox)?;
        if !commands.contains_key(&req.command) {
            return Err(ValidationError::UnknownCommand);
        }
        if req.files.count() < 2 && req.files.first().trim().is_empty() {
            return Err(ValidationError::EmptyRequest);
        }
        Ok(())
    }

    /// Execute a validated request.
    ///
    /// Fails with [`ExecError::Busy`] without running anything when every
    /// slot is taken.
    pub fn exec(&self, req: &Request) -> Execution {
        let _permit = match self.semaphore.try_acquire() {
            Ok(permit) => permit,
            Err(err) => return fail(&req.id, err),
        };
        let Some(engine) = self.engine(&req.sandbox, &req.command) else {
            let err = ExecError::argument("command", format!("unknown command {}", req.command));
            return fail(&req.id, err);
        };

        let start = Instant::now();
        let mut out = engine.exec(req);
        out.duration = start.elapsed().as_millis() as u64;
        out
    }

    pub fn engine(&self, sandbox: &str, command: &str) -> Option<&AnyEngine> {
        self.engines.get(sandbox)?.get(command)
    }
}

fn validate_command(sandbox: &str, name: &str, cmd: &CommandConfig) -> Result<()> {
    for step in cmd.before.iter().chain(&cmd.steps).chain(cmd.after.iter()) {
        if cmd.engine == "docker" && step.timeout == 0 {
            return Err(Error::InvalidConfig(format!(
                "{} {}: step timeout must be positive",
                sandbox, name
            )));
        }
    }
    Ok(())
}
