//! coderun: untrusted code execution in resource-bounded containers
//!
//! Executes code snippets on behalf of many concurrent callers. Each request
//! names a sandbox (a language or tool) and one of its commands. The command
//! runs as a pipeline of container steps, or as a single outbound HTTP
//! request, and the captured output comes back as an [`Execution`].
//!
//! # Modules
//!
//! - **config**: Configuration types and directory loader
//! - **execution**: Process supervision with deadlines and output limits
//! - **files**: Request files in the per-request work directory
//! - **engine**: Container and HTTP engines
//! - **sandbox**: Engine registry and admission gate
//! - **server**: HTTP API
//! - **logging**: Logger setup
//!
//! # Example
//!
//! ```ignore
//! use coderun::{config, OsRunner, Registry, Request};
//! use std::sync::Arc;
//!
//! let cfg = config::read("/etc/coderun")?;
//! let registry = Registry::from_config(cfg, Arc::new(OsRunner))?;
//!
//! let mut req = Request {
//!     sandbox: "python".into(),
//!     command: "run".into(),
//!     ..Default::default()
//! };
//! req.files.insert("", "print('hello')");
//! req.generate_id();
//!
//! registry.validate(&req)?;
//! let out = registry.exec(&req);
//! println!("{}", out.stdout);
//! ```

// Core modules
pub mod errors;
pub mod utils;

// Layered modules
pub mod config;
pub mod execution;
pub mod files;
pub mod engine;
pub mod sandbox;

// Outer surface
pub mod logging;
pub mod server;

// Public API
pub use config::Config;
pub use engine::{fail, AnyEngine, Engine, Execution, Files, Request};
pub use errors::{Error, ExecError, Result, ValidationError};
pub use execution::{OsRunner, Runner};
pub use sandbox::{Registry, Semaphore};
