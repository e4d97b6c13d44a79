//! File materializer: request files and box seed files in a work directory
//!
//! Every request file name is checked before anything is written, so a
//! single bad name leaves the work directory untouched.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use std::collections::HashSet;
use std::fs::{self, OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Component, Path, PathBuf};

use crate::engine::Files;
use crate::errors::ExecError;

/// Request files are read-only inside the container
pub const FILE_MODE: u32 = 0o444;

/// The container user is not the host user
pub const DIR_MODE: u32 = 0o777;

const DATA_URL_PREFIX: &str = "data:";

/// Write request files into `dir`.
///
/// A file with an empty name is written as `entry`. Names may contain
/// subdirectories but must stay inside `dir`.
pub fn write_files(dir: &Path, files: &Files, entry: &str) -> Result<(), ExecError> {
    let prepared = prepare(dir, files, entry)?;
    for (path, data) in prepared {
        write_file(&path, &data)
            .map_err(|e| ExecError::execution("write files to temp dir", e))?;
    }
    Ok(())
}

/// Copy every file matching the box `patterns` into `dir`
pub fn copy_box_files(patterns: &[String], dir: &Path) -> Result<(), ExecError> {
    for pattern in patterns {
        copy_files(pattern, dir).map_err(|e| ExecError::execution("copy files to temp dir", e))?;
    }
    Ok(())
}

/// Concatenated file contents, in name order
pub fn concat(files: &Files) -> Vec<u8> {
    let mut input = Vec::new();
    for (_, content) in files.iter() {
        input.extend_from_slice(content.as_bytes());
    }
    input
}

/// Resolve target paths and decode contents without touching the disk
fn prepare(dir: &Path, files: &Files, entry: &str) -> Result<Vec<(PathBuf, Vec<u8>)>, ExecError> {
    let mut seen = HashSet::new();
    let mut prepared = Vec::with_capacity(files.count());
    for (name, content) in files.iter() {
        let target = if name.is_empty() { entry } else { name };
        let path = safe_join(dir, target).ok_or_else(|| invalid_name(name))?;
        if !seen.insert(path.clone()) {
            return Err(ExecError::argument(file_arg(name), "duplicate name"));
        }
        let data = decode(content)
            .map_err(|reason| ExecError::argument(file_arg(name), reason))?;
        prepared.push((path, data));
    }
    Ok(prepared)
}

/// Join `name` to `dir` if the result stays strictly inside `dir`
pub fn safe_join(dir: &Path, name: &str) -> Option<PathBuf> {
    let rel = Path::new(name);
    let mut normal = 0;
    for component in rel.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if normal == 0 {
        return None;
    }
    Some(dir.join(rel))
}

/// File content as bytes. Content starting with `data:` is a base64 data URL
/// (`data:application/octet-stream;base64,MTIz`), anything else is text.
pub fn decode(content: &str) -> Result<Vec<u8>, &'static str> {
    if !content.starts_with(DATA_URL_PREFIX) {
        return Ok(content.as_bytes().to_vec());
    }
    let (_, encoded) = content
        .split_once(',')
        .ok_or("invalid data-url encoding")?;
    STANDARD
        .decode(encoded.trim())
        .map_err(|_| "invalid data-url encoding")
}

fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(FILE_MODE)
        .open(path)?;
    file.write_all(data)
}

fn copy_files(pattern: &str, dir: &Path) -> io::Result<()> {
    let matches = glob::glob(pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    for entry in matches {
        let src = entry.map_err(|e| e.into_error())?;
        if !src.is_file() {
            continue;
        }
        let Some(file_name) = src.file_name() else {
            continue;
        };
        let dst = dir.join(file_name);
        // an earlier step may have seeded the same file read-only
        if dst.exists() {
            fs::remove_file(&dst)?;
        }
        fs::copy(&src, &dst)?;
        fs::set_permissions(&dst, Permissions::from_mode(FILE_MODE))?;
        debug!("copied {} to {}", src.display(), dst.display());
    }
    Ok(())
}

fn file_arg(name: &str) -> String {
    format!("files[{}]", name)
}

fn invalid_name(name: &str) -> ExecError {
    ExecError::argument(file_arg(name), "invalid name")
}
