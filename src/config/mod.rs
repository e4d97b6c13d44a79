//! Configuration: boxes, sandbox commands and their steps
//!
//! A *box* is a single container image with its resource limits. A
//! *sandbox* is a named environment (usually a language) exposing one or
//! more *commands*, and each command is a pipeline of *steps*, every step
//! running in some box. So the relation sandbox -> box is 1 -> 1+.

mod load;
mod types;

pub use load::{read, read_json, CONFIG_FILENAME, SANDBOXES_DIRNAME};
pub use types::{Action, BoxConfig, CommandConfig, Config, HttpConfig, SandboxCommands, StepConfig};
