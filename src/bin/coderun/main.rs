//! coderun CLI - execute code snippets and inspect sandbox configuration

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use coderun::{config, logging, OsRunner, Registry, Request};
use console::style;
use std::process;
use std::sync::Arc;

fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let cfg = match config::read(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => fatal(e),
    };

    match cli.command {
        Commands::Exec {
            sandbox,
            command,
            version,
            files,
        } => {
            let files = match commands::read_files(&files) {
                Ok(files) => files,
                Err(e) => fatal(e),
            };
            let registry = match Registry::from_config(cfg, Arc::new(OsRunner)) {
                Ok(registry) => registry,
                Err(e) => fatal(e),
            };
            let req = Request {
                id: String::new(),
                sandbox,
                version,
                command,
                files,
            };
            match commands::exec(&registry, req) {
                Ok(true) => {}
                Ok(false) => process::exit(1),
                Err(e) => fatal(e),
            }
        }
        Commands::Boxes => commands::list_boxes(&cfg),
        Commands::Commands => commands::list_commands(&cfg),
        Commands::Config => commands::print_config(&cfg),
    }
}

fn fatal(err: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("error:").red().bold(), err);
    eprintln!(
        "Try {} for more information",
        style("coderun --help").cyan()
    );
    process::exit(1);
}
