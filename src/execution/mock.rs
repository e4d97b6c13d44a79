//! A [`Runner`] that runs nothing, for tests

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use super::runner::{ExitState, Invocation, Runner};

/// How a mocked program finishes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MockExit {
    #[default]
    Success,
    Failed(String),
    Killed,
    /// The program cannot be started
    NotFound,
}

/// Canned output of a mocked program
#[derive(Debug, Clone, Default)]
pub struct MockOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit: MockExit,
}

impl MockOutput {
    pub fn stdout(s: &str) -> Self {
        Self {
            stdout: s.to_string(),
            ..Default::default()
        }
    }

    pub fn stderr(s: &str) -> Self {
        Self {
            stderr: s.to_string(),
            ..Default::default()
        }
    }

    pub fn exit(mut self, exit: MockExit) -> Self {
        self.exit = exit;
        self
    }
}

/// A recorded invocation
#[derive(Debug, Clone)]
pub struct MockCall {
    pub line: String,
    pub stdin: Option<String>,
}

/// Records invocations and answers with canned outputs.
///
/// Outputs are looked up by `"<program> <first arg>"`, e.g. `"docker run"`.
/// Unknown invocations succeed with empty output.
#[derive(Debug, Default)]
pub struct MockRunner {
    outputs: HashMap<String, MockOutput>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations matching `key` with `output`
    pub fn with(mut self, key: &str, output: MockOutput) -> Self {
        self.outputs.insert(key.to_string(), output);
        self
    }

    /// Recorded invocations, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().clone()
    }

    /// Recorded command lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(|c| c.line.clone()).collect()
    }

    /// Whether some single command line contains all the parts
    pub fn has(&self, parts: &[&str]) -> bool {
        self.lock()
            .iter()
            .any(|c| parts.iter().all(|p| c.line.contains(p)))
    }

    /// Poll until [`MockRunner::has`] holds or `timeout` passes
    pub fn wait_for(&self, parts: &[&str], timeout: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if self.has(parts) {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        self.has(parts)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        self.calls.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Runner for MockRunner {
    fn run(
        &self,
        invocation: &Invocation,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> io::Result<ExitState> {
        self.lock().push(MockCall {
            line: invocation.command_line(),
            stdin: invocation
                .stdin
                .as_ref()
                .map(|data| String::from_utf8_lossy(data).into_owned()),
        });

        let key = match invocation.args.first() {
            Some(arg) => format!("{} {}", invocation.program, arg),
            None => invocation.program.clone(),
        };
        let output = self.outputs.get(&key).cloned().unwrap_or_default();

        if output.exit == MockExit::NotFound {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: program not found", invocation.program),
            ));
        }
        stdout.write_all(output.stdout.as_bytes())?;
        stderr.write_all(output.stderr.as_bytes())?;
        Ok(match output.exit {
            MockExit::Success | MockExit::NotFound => ExitState::Success,
            MockExit::Failed(status) => ExitState::Failed(status),
            MockExit::Killed => ExitState::Killed,
        })
    }
}
