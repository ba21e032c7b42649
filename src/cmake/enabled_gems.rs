//! The generated `enabled_gems.cmake` writer.
//!
//! The file carries exactly one `set(ENABLED_GEMS ...)` invocation. The
//! parser is tolerant: the list may be inline or one-entry-per-line, and
//! entries may be quoted. The rewriter normalizes to the multi-line form,
//! preserving any comment block above the `set(` call.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::utils::atomic_write;

const SET_PREFIX: &str = "set(ENABLED_GEMS";

/// The set of gem names currently enabled in the file.
///
/// A missing file parses as the empty set.
pub fn get_enabled_gems(path: &Path) -> Result<HashSet<String>> {
    Ok(parse_file(path)?.gems.into_iter().collect())
}

/// Add `gem_name` to the enabled list. Idempotent.
pub fn add_gem_dependency(path: &Path, gem_name: &str) -> Result<()> {
    let mut parsed = parse_file(path)?;
    if !parsed.gems.iter().any(|g| g == gem_name) {
        parsed.gems.push(gem_name.to_string());
    }
    write_file(path, &parsed)
}

/// Remove every occurrence of `gem_name` from the enabled list.
///
/// Fails when the gem is not present, so callers can surface a typo instead
/// of silently succeeding.
pub fn remove_gem_dependency(path: &Path, gem_name: &str) -> Result<()> {
    let mut parsed = parse_file(path)?;
    let before = parsed.gems.len();
    parsed.gems.retain(|g| g != gem_name);
    if parsed.gems.len() == before {
        return Err(anyhow!(
            "Gem '{}' is not enabled in {}",
            gem_name,
            path.display()
        ));
    }
    write_file(path, &parsed)
}

struct EnabledGemsFile {
    /// Lines above the set() call, preserved byte-for-byte
    header: Vec<String>,
    /// Enabled gem names in file order
    gems: Vec<String>,
}

fn parse_file(path: &Path) -> Result<EnabledGemsFile> {
    if !path.exists() {
        return Ok(EnabledGemsFile { header: Vec::new(), gems: Vec::new() });
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let Some(start) = content.find(SET_PREFIX) else {
        // No list yet: keep the whole file as header and start a fresh list.
        return Ok(EnabledGemsFile {
            header: content.lines().map(str::to_string).collect(),
            gems: Vec::new(),
        });
    };

    let header = content[..start]
        .lines()
        .map(str::to_string)
        .collect();

    let rest = &content[start + SET_PREFIX.len()..];
    let body_end = rest
        .find(')')
        .with_context(|| format!("Unterminated set(ENABLED_GEMS in {}", path.display()))?;
    let gems = rest[..body_end]
        .split_whitespace()
        .map(|token| token.trim_matches('"').to_string())
        .filter(|token| !token.is_empty())
        .collect();

    Ok(EnabledGemsFile { header, gems })
}

fn write_file(path: &Path, parsed: &EnabledGemsFile) -> Result<()> {
    let mut rendered = String::new();
    for line in &parsed.header {
        rendered.push_str(line);
        rendered.push('\n');
    }
    rendered.push_str(SET_PREFIX);
    rendered.push('\n');
    for gem in &parsed.gems {
        rendered.push_str("    ");
        rendered.push_str(gem);
        rendered.push('\n');
    }
    rendered.push_str(")\n");
    atomic_write(path, rendered.as_bytes())
}
