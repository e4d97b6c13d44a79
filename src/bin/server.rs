//! coderun API server
//!
//! ## Endpoints
//!
//! POST /v1/exec - Execute code
//! GET /health - Liveness check

use actix_web::{web, App, HttpServer};
use clap::Parser;
use coderun::{config, logging, server, OsRunner, Registry};
use console::style;
use log::info;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "coderun-server")]
#[command(version, about = "HTTP API for sandboxed code execution", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 1313)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Configuration directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    config: PathBuf,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let cfg = match config::read(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            process::exit(1);
        }
    };
    logging::init_logger(args.verbose || cfg.verbose);

    info!("config dir: {}", args.config.display());
    info!("workers: {}", cfg.pool_size);
    info!("boxes: {:?}", cfg.box_names());
    info!("commands: {:?}", cfg.command_names());

    let registry = match Registry::from_config(cfg, Arc::new(OsRunner)) {
        Ok(registry) => web::Data::new(registry),
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            process::exit(1);
        }
    };

    info!("listening on {}:{}", args.host, args.port);
    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .wrap(server::cors())
            .configure(server::routes)
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await
}
