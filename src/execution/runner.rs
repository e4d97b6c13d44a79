//! Running external programs

use log::debug;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::{self, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

use super::stream;

/// A single external program invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Data for stdin; `None` means the child gets no stdin at all
    pub stdin: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl Invocation {
    /// The whole invocation as a single line, for logs
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// How a program finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitState {
    Success,
    /// Unsuccessful exit, e.g. `exit status 1`
    Failed(String),
    /// Forcibly killed, usually by the deadline
    Killed,
}

/// Runs external programs.
///
/// This is the seam between the engines and the operating system.
pub trait Runner: Send + Sync {
    /// Run the program to completion or until the deadline, copying its
    /// output into the sinks. An `Err` means the program could not be run.
    fn run(
        &self,
        invocation: &Invocation,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> io::Result<ExitState>;
}

/// Runs real OS processes
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRunner;

impl Runner for OsRunner {
    fn run(
        &self,
        invocation: &Invocation,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> io::Result<ExitState> {
        let stdin_cfg = if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        // own process group, so the deadline kills the whole tree
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(stdin_cfg)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()?;

        let stdin_pipe = child.stdin.take();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        // The drains end at pipe EOF, and the scope joins them. After the
        // deadline kill, EOF arrives only if every process holding the pipes
        // was in the group. A descendant that calls setsid and keeps stdout
        // open would hold the scope past the deadline. The container CLI
        // does not do that.
        thread::scope(|s| {
            if let (Some(pipe), Some(data)) = (stdin_pipe, invocation.stdin.as_deref()) {
                s.spawn(move || stream::feed(pipe, data));
            }
            if let Some(pipe) = stdout_pipe {
                s.spawn(move || stream::drain(pipe, stdout));
            }
            if let Some(pipe) = stderr_pipe {
                s.spawn(move || stream::drain(pipe, stderr));
            }
            wait_deadline(&mut child, invocation.timeout)
        })
    }
}

fn wait_deadline(child: &mut Child, timeout: Duration) -> io::Result<ExitState> {
    match child.wait_timeout(timeout)? {
        Some(status) => Ok(exit_state(status)),
        None => {
            kill_tree(child);
            child.wait()?;
            Ok(ExitState::Killed)
        }
    }
}

fn kill_tree(child: &mut Child) {
    let pid = Pid::from_raw(child.id() as i32);
    match killpg(pid, Signal::SIGKILL) {
        Ok(()) => debug!("killed process group {}", pid),
        Err(e) => {
            debug!("killpg {} failed: {}, killing process", pid, e);
            let _ = child.kill();
        }
    }
}

fn exit_state(status: ExitStatus) -> ExitState {
    if status.success() {
        return ExitState::Success;
    }
    match (status.code(), status.signal()) {
        (Some(code), _) => ExitState::Failed(format!("exit status {}", code)),
        (None, Some(sig)) if sig == Signal::SIGKILL as i32 => ExitState::Killed,
        (None, Some(sig)) => ExitState::Failed(format!("signal: {}", sig)),
        (None, None) => ExitState::Failed("unknown exit status".to_string()),
    }
}
