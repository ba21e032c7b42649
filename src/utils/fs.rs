//! File system operations with atomic writes and JSON helpers.
//!
//! All mutating helpers write through a temporary file in the target's
//! parent directory and rename into place, so a crash mid-write leaves the
//! previous contents intact. The rename stays on one filesystem because the
//! temp file is created next to the destination.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Ensure a directory exists, creating it and any missing parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write `contents` to `path` atomically.
///
/// The bytes land in a temporary file in the destination's parent directory,
/// are flushed, and the temp file is renamed over the destination. Readers
/// see either the old contents or the new, never a partial write.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("Path has no parent directory: {}", path.display()))?;
    ensure_dir(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    temp.write_all(contents)
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    temp.flush()?;
    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Read and deserialize a JSON file into `T`.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))
}

/// Read a JSON file as an untyped [`serde_json::Value`].
pub fn read_json_value(path: &Path) -> Result<serde_json::Value> {
    read_json_file(path)
}

/// Serialize `value` as pretty-printed JSON and write it atomically.
///
/// A trailing newline is appended so the files diff cleanly under version
/// control.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut rendered = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize JSON for {}", path.display()))?;
    rendered.push('\n');
    atomic_write(path, rendered.as_bytes())
}
