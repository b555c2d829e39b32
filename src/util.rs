// src/util.rs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Read a UTF-8 file into a String with a clear error message.
///
/// Used for `--program-file` and `--assertions-file`.
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Resolve one invocation input from its inline or file form.
///
/// Clap guarantees exactly one of the two is present.
pub fn resolve_input(inline: Option<&str>, file: Option<&PathBuf>, what: &str) -> Result<String> {
    match (inline, file) {
        (_, Some(path)) => read_to_string(path),
        (Some(text), None) => Ok(text.to_string()),
        (None, None) => anyhow::bail!("No {what} supplied"),
    }
}
