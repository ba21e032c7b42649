//! Path canonicalization helpers.
//!
//! Every path stored in the manifest or a descriptor file must be absolute
//! and resolved, so registrations survive `cd` and symlink churn. These
//! helpers centralize that normalization.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

/// Canonicalize a path, tolerating a missing final component.
///
/// If the path itself does not exist but its parent does, the parent is
/// canonicalized and the file name re-joined. This lets callers normalize
/// output paths that have not been created yet.
pub fn safe_canonicalize(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            if parent.exists() {
                let canonical_parent = parent.canonicalize().with_context(|| {
                    format!("Failed to canonicalize parent of '{}'", path.display())
                })?;
                if let Some(file_name) = path.file_name() {
                    return Ok(canonical_parent.join(file_name));
                }
            }
        }
        return Err(anyhow!("Path does not exist: {}", path.display()));
    }

    path.canonicalize()
        .with_context(|| format!("Failed to canonicalize path: {}", path.display()))
}

/// Resolve `path` to an absolute, canonical form.
///
/// Relative paths are resolved against `base` when given, otherwise against
/// the current working directory.
pub fn resolve_absolute(path: &Path, base: Option<&Path>) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else if let Some(base) = base {
        base.join(path)
    } else {
        std::env::current_dir().context("Failed to read current directory")?.join(path)
    };
    safe_canonicalize(&absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_safe_canonicalize_existing_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        let canonical = safe_canonicalize(&file).unwrap();
        assert!(canonical.is_absolute());
        assert!(canonical.ends_with("file.txt"));
    }

    #[test]
    fn test_safe_canonicalize_missing_file_with_existing_parent() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not_yet.txt");

        let canonical = safe_canonicalize(&file).unwrap();
        assert!(canonical.ends_with("not_yet.txt"));
    }

    #[test]
    fn test_safe_canonicalize_missing_parent_fails() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("no/such/dir/file.txt");

        assert!(safe_canonicalize(&file).is_err());
    }

    #[test]
    fn test_resolve_absolute_with_base() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();

        let resolved = resolve_absolute(Path::new("sub"), Some(temp.path())).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("sub"));
    }
}
