// src/watch/path.rs

//! String-level path helpers.
//!
//! Watched directories are keyed by their canonical path with a trailing
//! slash (`/w/a/`); symbolic links are keyed by the link's own path without
//! one (`/w/link`). With that convention a plain prefix test answers "is this
//! inside that directory", which is the only relationship the table needs.

use std::path::Path;

use crate::errors::{Result, TreewatchError};
use crate::fs::FileSystem;

/// Resolve `path` to its absolute, symlink-free, slash-terminated form.
pub fn canonicalize<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<String> {
    let display = path.display().to_string();
    let real = fs
        .canonicalize(path)
        .map_err(|source| TreewatchError::path_unavailable(display.clone(), source))?;

    let Some(real) = real.to_str() else {
        return Err(TreewatchError::path_unavailable(
            display,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "path is not valid UTF-8"),
        ));
    };
    Ok(with_trailing_slash(real))
}

pub fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// True when `candidate` equals `ancestor` or lies below it.
///
/// `ancestor` must be slash-terminated.
pub fn is_child_of(candidate: &str, ancestor: &str) -> bool {
    candidate.starts_with(ancestor)
}

/// Path of the subdirectory `name` inside `dir`.
pub fn join_dir(dir: &str, name: &str) -> String {
    format!("{dir}{name}/")
}

/// Path of the non-directory entry `name` inside `dir`.
pub fn join_entry(dir: &str, name: &str) -> String {
    format!("{dir}{name}")
}

/// Directory holding `path`, slash-terminated. `None` for `/`.
pub fn parent_dir(path: &str) -> Option<&str> {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let idx = trimmed.rfind('/')?;
    Some(&path[..=idx])
}
