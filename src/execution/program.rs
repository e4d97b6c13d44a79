//! Process supervisor: deadline, bounded capture, failure classification

use log::debug;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::limit::LimitedWriter;
use super::runner::{ExitState, Invocation, Runner};

/// Captured, trimmed program output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
}

/// Why a supervised program did not succeed
#[derive(Error, Debug)]
pub enum RunError {
    /// Killed, usually because the deadline expired
    #[error("signal: killed")]
    Killed,

    /// The program ran and exited unsuccessfully
    #[error("{status}")]
    Exit {
        status: String,
        stdout: String,
        stderr: String,
    },

    /// The program could not be run at all
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An external program with a deadline and an output ceiling
#[derive(Clone)]
pub struct Program {
    timeout: Duration,
    max_output: usize,
    runner: Arc<dyn Runner>,
}

impl Program {
    pub fn new(timeout: Duration, max_output: usize, runner: Arc<dyn Runner>) -> Self {
        Self {
            timeout,
            max_output,
            runner,
        }
    }

    /// Run the program without stdin and wait for it to finish (or time out)
    pub fn run(&self, id: &str, program: &str, args: &[String]) -> Result<Output, RunError> {
        self.execute(id, program, args, None)
    }

    /// Run the program feeding `stdin` to it
    pub fn run_stdin(
        &self,
        stdin: Vec<u8>,
        id: &str,
        program: &str,
        args: &[String],
    ) -> Result<Output, RunError> {
        self.execute(id, program, args, Some(stdin))
    }

    fn execute(
        &self,
        id: &str,
        program: &str,
        args: &[String],
        stdin: Option<Vec<u8>>,
    ) -> Result<Output, RunError> {
        let invocation = Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            stdin,
            timeout: self.timeout,
        };

        let mut stdout = LimitedWriter::new(Vec::new(), self.max_output);
        let mut stderr = LimitedWriter::new(Vec::new(), self.max_output);
        let state = self.runner.run(&invocation, &mut stdout, &mut stderr)?;

        let stdout = trimmed(stdout.into_inner());
        let stderr = trimmed(stderr.into_inner());
        match state {
            ExitState::Success => Ok(Output { stdout, stderr }),
            ExitState::Failed(status) => Err(RunError::Exit {
                status,
                stdout,
                stderr,
            }),
            ExitState::Killed => {
                debug!(
                    "{}: execution timeout, killed {} after {:?}",
                    id, program, self.timeout
                );
                Err(RunError::Killed)
            }
        }
    }
}

fn trimmed(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).trim().to_string()
}
