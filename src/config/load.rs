//! Configuration loader
//!
//! Layout, relative to the base directory:
//!
//! ```text
//! coderun.json
//! sandboxes/
//!   python/
//!     box.json        -> box "python"
//!     box.dev.json    -> box "python:dev"
//!     commands.json   -> commands of sandbox "python"
//! ```

use log::debug;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{BoxConfig, Config, SandboxCommands};
use crate::errors::{Error, Result};

pub const CONFIG_FILENAME: &str = "coderun.json";
pub const SANDBOXES_DIRNAME: &str = "sandboxes";

const BOX_PATTERN: &str = "*/box*.json";
const COMMANDS_PATTERN: &str = "*/commands.json";

/// Read application config, boxes and commands from `base`
pub fn read(base: impl AsRef<Path>) -> Result<Config> {
    let base = base.as_ref();
    let mut cfg = read_config(&base.join(CONFIG_FILENAME))?;

    let sandboxes = base.join(SANDBOXES_DIRNAME);
    cfg.boxes = read_boxes(&sandboxes)?;
    cfg.commands = read_commands(&sandboxes)?;
    cfg.apply_defaults();
    Ok(cfg)
}

/// Read a JSON file into `T`
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_config(path: &Path) -> Result<Config> {
    debug!("reading config from {}", path.display());
    let cfg: Config = read_json(path)?;
    if cfg.box_defaults.is_none() {
        return Err(Error::InvalidConfig(format!(
            "{}: missing box defaults",
            path.display()
        )));
    }
    if cfg.step_defaults.is_none() {
        return Err(Error::InvalidConfig(format!(
            "{}: missing step defaults",
            path.display()
        )));
    }
    Ok(cfg)
}

fn read_boxes(dir: &Path) -> Result<HashMap<String, BoxConfig>> {
    debug!("reading boxes from {}/{}", dir.display(), BOX_PATTERN);
    let mut boxes = HashMap::new();
    for path in glob_files(dir, BOX_PATTERN)? {
        let mut bx: BoxConfig = read_json(&path)?;
        let name = match &bx.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => box_name(&path),
        };
        if let Some(parent) = path.parent() {
            bx.files = bx
                .files
                .iter()
                .map(|pattern| resolve_pattern(parent, pattern))
                .collect();
        }
        bx.name = Some(name.clone());
        boxes.insert(name, bx);
    }
    Ok(boxes)
}

fn read_commands(dir: &Path) -> Result<HashMap<String, SandboxCommands>> {
    debug!("reading commands from {}/{}", dir.display(), COMMANDS_PATTERN);
    let mut commands = HashMap::new();
    for path in glob_files(dir, COMMANDS_PATTERN)? {
        let sandbox = parent_name(&path);
        let cmds: SandboxCommands = read_json(&path)?;
        commands.insert(sandbox, cmds);
    }
    Ok(commands)
}

fn glob_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = dir.join(pattern);
    let mut paths = Vec::new();
    for entry in glob::glob(&full.to_string_lossy())? {
        paths.push(entry.map_err(|e| Error::Io(e.into_error()))?);
    }
    Ok(paths)
}

/// `python/box.json` -> `python`, `python/box.dev.json` -> `python:dev`
fn box_name(path: &Path) -> String {
    let sandbox = parent_name(path);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_prefix("box.") {
        Some(version) if !version.is_empty() => format!("{}:{}", sandbox, version),
        _ => sandbox,
    }
}

fn parent_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn resolve_pattern(dir: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        dir.join(pattern).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_name_from_path() {
        assert_eq!(box_name(Path::new("/cfg/sandboxes/python/box.json")), "python");
        assert_eq!(
            box_name(Path::new("/cfg/sandboxes/python/box.dev.json")),
            "python:dev"
        );
    }

    #[test]
    fn test_resolve_pattern() {
        assert_eq!(resolve_pattern(Path::new("/a"), "/etc/x"), "/etc/x");
        assert_eq!(resolve_pattern(Path::new("/a"), "*.sql"), "/a/*.sql");
    }
}
