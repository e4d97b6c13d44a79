use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "coderun")]
#[command(version, about = "Run code snippets in configured sandboxes", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Run a python file (the first file is the entry point)
    coderun exec --sandbox python main.py lib.py

    # Pick a command and a box version
    coderun exec -s python -c test --version dev test.py

    # Read the entry file from stdin
    echo 'print(42)' | coderun exec -s python -

    # Inspect configuration
    coderun --config /etc/coderun boxes
    coderun commands
    coderun config
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration directory
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub config: PathBuf,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute code in a sandbox
    Exec {
        /// Sandbox name
        #[arg(short, long)]
        sandbox: String,

        /// Sandbox command
        #[arg(short, long, default_value = "run")]
        command: String,

        /// Box version
        #[arg(long, default_value = "")]
        version: String,

        /// Files to execute; the first one is the entry point, `-` is stdin
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// List configured boxes
    Boxes,

    /// List sandboxes and their commands
    Commands,

    /// Print the effective configuration
    Config,
}
