use coderun::{Config, Files, Registry, Request};
use console::style;
use log::info;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Run one request through the registry. Returns whether it succeeded.
pub fn exec(registry: &Registry, mut req: Request) -> coderun::Result<bool> {
    req.generate_id();
    if let Err(e) = registry.validate(&req) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        return Ok(false);
    }

    info!("{}: executing", req.id);
    let out = registry.exec(&req);
    if !out.stdout.is_empty() {
        println!("{}", out.stdout);
    }
    if !out.stderr.is_empty() {
        eprintln!("{}", out.stderr);
    }
    info!("{}: ok={}, took {} ms", out.id, out.ok, out.duration);
    Ok(out.ok)
}

/// Request files from paths. The first file is the entry file.
pub fn read_files(paths: &[impl AsRef<Path>]) -> coderun::Result<Files> {
    let mut files = Files::new();
    for (i, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let content = if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            fs::read_to_string(path)?
        };
        let name = if i == 0 {
            String::new()
        } else {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        files.insert(name, content);
    }
    Ok(files)
}

pub fn list_boxes(cfg: &Config) {
    println!("Available boxes:\n");
    for name in cfg.box_names() {
        let bx = &cfg.boxes[&name];
        println!(
            "  {:20} {} ({} cpu, {}m memory, network {})",
            name, bx.image, bx.cpu, bx.memory, bx.network
        );
    }
}

pub fn list_commands(cfg: &Config) {
    println!("Available commands:\n");
    for sandbox in cfg.command_names() {
        let Some(commands) = cfg.commands.get(&sandbox) else {
            continue;
        };
        let mut names: Vec<&String> = commands.keys().collect();
        names.sort();
        for name in names {
            let cmd = &commands[name];
            println!(
                "  {:20} {:8} {} step(s)",
                format!("{} {}", sandbox, name),
                cmd.engine,
                cmd.steps.len()
            );
        }
    }
}

pub fn print_config(cfg: &Config) {
    println!("{}", cfg.to_json());
}
