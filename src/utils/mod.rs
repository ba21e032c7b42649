//! Cross-platform utilities and helpers.
//!
//! This module provides the file-system primitives the rest of the crate is
//! built on: atomic writes, JSON file round-trips, and path resolution.
//!
//! # Modules
//!
//! - [`fs`] - File system operations with atomic writes and JSON helpers
//! - [`path_validation`] - Path canonicalization and absolutization
//!
//! Every file this tool owns (the per-user manifest, descriptor files,
//! generated CMake files, cached repo manifests) is rewritten through
//! [`atomic_write`], so readers never observe a torn file.

pub mod fs;
pub mod path_validation;

pub use fs::{atomic_write, ensure_dir, read_json_file, read_json_value, write_json_file};
pub use path_validation::{resolve_absolute, safe_canonicalize};

/// Canonicalize a repo URI for identity comparison and cache addressing.
///
/// Trailing slashes are stripped so `https://example.com/repo/` and
/// `https://example.com/repo` map to the same cache entry.
#[must_use]
pub fn canonical_repo_uri(uri: &str) -> String {
    uri.trim().trim_end_matches('/').to_string()
}

/// Compute the content-addressed cache file name for a repo URI.
///
/// The name is the SHA-256 of the canonicalized URI, hex encoded, with a
/// `.json` extension.
#[must_use]
pub fn repo_cache_file_name(uri: &str) -> String {
    use sha2::{Digest, Sha256};

    let digest = Sha256::digest(canonical_repo_uri(uri).as_bytes());
    format!("{}.json", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_repo_uri_strips_trailing_slash() {
        assert_eq!(canonical_repo_uri("https://example.com/repo/"), "https://example.com/repo");
        assert_eq!(canonical_repo_uri("https://example.com/repo"), "https://example.com/repo");
    }

    #[test]
    fn test_repo_cache_file_name_is_stable_across_slash_variants() {
        let a = repo_cache_file_name("https://example.com/repo/");
        let b = repo_cache_file_name("https://example.com/repo");
        assert_eq!(a, b);
        assert!(a.ends_with(".json"));
    }

    #[test]
    fn test_repo_cache_file_name_differs_per_uri() {
        assert_ne!(
            repo_cache_file_name("https://example.com/a"),
            repo_cache_file_name("https://example.com/b")
        );
    }
}
