use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Default number of concurrent executions
pub const DEFAULT_POOL_SIZE: usize = 8;

/// Default container CLI binary
pub const DEFAULT_CONTAINER_CLI: &str = "docker";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of concurrent executions
    pub pool_size: usize,
    /// Enable debug logging
    pub verbose: bool,
    /// Container CLI to shell out to (`docker`, `podman`)
    pub container_cli: String,
    /// Defaults for every box
    #[serde(rename = "box", skip_serializing_if = "Option::is_none")]
    pub box_defaults: Option<BoxConfig>,
    /// Defaults for every command step
    #[serde(rename = "step", skip_serializing_if = "Option::is_none")]
    pub step_defaults: Option<StepConfig>,
    /// Outbound-request engine settings
    pub http: HttpConfig,
    /// Available containers by name (`python`, `python:dev`)
    pub boxes: HashMap<String, BoxConfig>,
    /// Sandbox name -> command name -> command
    pub commands: HashMap<String, SandboxCommands>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            verbose: false,
            container_cli: DEFAULT_CONTAINER_CLI.to_string(),
            box_defaults: None,
            step_defaults: None,
            http: HttpConfig::default(),
            boxes: HashMap::new(),
            commands: HashMap::new(),
        }
    }
}

impl Config {
    /// Sorted box names
    pub fn box_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.boxes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted sandbox names
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up a command of a sandbox
    pub fn command(&self, sandbox: &str, command: &str) -> Option<&CommandConfig> {
        self.commands.get(sandbox)?.get(command)
    }

    /// Fill zero-valued box and step fields from the configured defaults
    pub fn apply_defaults(&mut self) {
        if let Some(defs) = &self.box_defaults {
            for b in self.boxes.values_mut() {
                b.apply_defaults(defs);
            }
        }
        if let Some(defs) = &self.step_defaults {
            for commands in self.commands.values_mut() {
                for cmd in commands.values_mut() {
                    cmd.apply_step_defaults(defs);
                }
            }
        }
    }

    /// Indented JSON representation
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// A container image with its runtime and resource limits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub image: String,
    pub runtime: String,
    /// Number of CPUs
    pub cpu: u32,
    /// Memory limit in megabytes
    pub memory: u32,
    /// Writable layer size (`16m`)
    pub storage: String,
    pub network: String,
    /// Keep the container root filesystem writable
    pub writable: bool,
    /// Volume template, `%s` is replaced by the work directory
    pub volume: String,
    pub tmpfs: Option<Vec<String>>,
    pub cap_add: Option<Vec<String>>,
    pub cap_drop: Option<Vec<String>>,
    pub ulimit: Option<Vec<String>>,
    /// Process count limit. Not the `nproc` ulimit, which is per-user.
    pub nproc: u32,
    /// Glob patterns of files seeded into every work directory
    pub files: Vec<String>,
}

impl BoxConfig {
    pub fn apply_defaults(&mut self, defs: &BoxConfig) {
        if self.runtime.is_empty() {
            self.runtime = defs.runtime.clone();
        }
        if self.cpu == 0 {
            self.cpu = defs.cpu;
        }
        if self.memory == 0 {
            self.memory = defs.memory;
        }
        if self.storage.is_empty() {
            self.storage = defs.storage.clone();
        }
        if self.network.is_empty() {
            self.network = defs.network.clone();
        }
        if self.volume.is_empty() {
            self.volume = defs.volume.clone();
        }
        if self.tmpfs.is_none() {
            self.tmpfs = defs.tmpfs.clone();
        }
        if self.cap_add.is_none() {
            self.cap_add = defs.cap_add.clone();
        }
        if self.cap_drop.is_none() {
            self.cap_drop = defs.cap_drop.clone();
        }
        if self.ulimit.is_none() {
            self.ulimit = defs.ulimit.clone();
        }
        if self.nproc == 0 {
            self.nproc = defs.nproc;
        }
    }
}

/// Step action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Create and run a new container
    #[default]
    Run,
    /// Run a command inside an existing container
    Exec,
    /// Stop an existing container
    Stop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Run => "run",
            Action::Exec => "exec",
            Action::Stop => "stop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands of a single sandbox by name
pub type SandboxCommands = HashMap<String, CommandConfig>;

/// A named operation within a sandbox
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Engine kind (`docker`, `http`)
    pub engine: String,
    /// File name for the request file with an empty name
    pub entry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<StepConfig>,
    pub steps: Vec<StepConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<StepConfig>,
}

impl CommandConfig {
    fn apply_step_defaults(&mut self, defs: &StepConfig) {
        if let Some(step) = self.before.as_mut() {
            step.apply_defaults(defs);
        }
        for step in self.steps.iter_mut() {
            step.apply_defaults(defs);
        }
        if let Some(step) = self.after.as_mut() {
            step.apply_defaults(defs);
        }
    }
}

/// A single step of a command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Box name, or a container name (may contain `:name`)
    #[serde(rename = "box")]
    pub box_name: String,
    /// Box version; `latest` selects the untagged box
    pub version: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Leave the container running in the background
    pub detach: bool,
    /// Feed request files through stdin
    pub stdin: bool,
    pub command: Vec<String>,
    /// Timeout in seconds
    pub timeout: u64,
    /// Output ceiling in bytes, per stream
    #[serde(rename = "noutput", alias = "max_output")]
    pub max_output: usize,
}

impl StepConfig {
    pub fn action(&self) -> Action {
        self.action.unwrap_or_default()
    }

    pub fn apply_defaults(&mut self, defs: &StepConfig) {
        if self.user.is_empty() {
            self.user = defs.user.clone();
        }
        if self.action.is_none() {
            self.action = defs.action;
        }
        if self.timeout == 0 {
            self.timeout = defs.timeout;
        }
        if self.max_output == 0 {
            self.max_output = defs.max_output;
        }
    }
}

/// Outbound-request engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Allowed host -> backend address it is rewritten to
    pub hosts: HashMap<String, String>,
}
