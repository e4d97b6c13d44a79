//! Execution layer: running external programs under supervision
//!
//! # Features
//!
//! - **Deadline**: every invocation has a hard wall-clock timeout, after
//!   which the whole process group is killed
//! - **Bounded capture**: stdout and stderr are captured separately, each
//!   cut to a byte ceiling without back-pressuring the child
//! - **Classification**: a killed program, an unsuccessful exit and a
//!   failure to start are reported as distinct [`RunError`] variants
//!
//! # Examples
//!
//! ```ignore
//! use coderun::execution::{OsRunner, Program};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let prog = Program::new(Duration::from_secs(3), 4096, Arc::new(OsRunner));
//! let out = prog.run("req_42", "echo", &["hello".to_string()])?;
//! assert_eq!(out.stdout, "hello");
//! ```

pub mod limit;
pub mod mock;
pub mod program;
pub mod runner;
pub mod stream;

pub use limit::LimitedWriter;
pub use mock::{MockExit, MockOutput, MockRunner};
pub use program::{Output, Program, RunError};
pub use runner::{ExitState, Invocation, OsRunner, Runner};
