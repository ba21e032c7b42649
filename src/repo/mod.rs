//! Remote repo manifest cache.
//!
//! A repo is a remotely published `repo.json` listing downloadable gems and,
//! optionally, further repos. Refreshing downloads that manifest into a
//! content-addressed cache folder (`<home>/.o3de/cache`), named by the
//! SHA-256 of the canonicalized URI, then recurses into the nested repos.
//! Recursion carries an explicit visited set so mutually referencing repos
//! terminate.
//!
//! Local development repos are first-class: `file://` URIs and plain
//! filesystem paths are copied instead of fetched over HTTP.

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::O3deError;
use crate::manifest::Manifest;
use crate::models::{ObjectKind, RepoDescriptor, RepoGemEntry};
use crate::utils::{atomic_write, canonical_repo_uri, ensure_dir, repo_cache_file_name};
use crate::version::{GemSpecifier, parse_gem_version, sentinel_version};

/// Cache file path for a repo URI.
#[must_use]
pub fn repo_cache_path(cache_dir: &Path, uri: &str) -> PathBuf {
    cache_dir.join(repo_cache_file_name(uri))
}

/// Refresh one repo manifest into the cache, recursing into nested repos.
///
/// `visited` guards against reference cycles and is keyed by canonical URI;
/// `missing_only` keeps already-cached files as they are.
pub async fn refresh_repo(
    cache_dir: &Path,
    uri: &str,
    visited: &mut HashSet<String>,
    missing_only: bool,
) -> Result<()> {
    let canonical = canonical_repo_uri(uri);
    if !visited.insert(canonical.clone()) {
        debug!(uri = %canonical, "repo already refreshed in this pass");
        return Ok(());
    }

    let cache_path = repo_cache_path(cache_dir, &canonical);
    if missing_only && cache_path.is_file() {
        debug!(uri = %canonical, "cached repo manifest present; skipping fetch");
    } else {
        let bytes = fetch_repo_manifest(&canonical).await?;
        // Validate before replacing the cache so a bad fetch cannot clobber
        // a previously good manifest.
        serde_json::from_slice::<serde_json::Value>(&bytes).map_err(|e| {
            O3deError::DescriptorParseError { file: canonical.clone(), reason: e.to_string() }
        })?;
        ensure_dir(cache_dir)?;
        atomic_write(&cache_path, &bytes)?;
        info!(uri = %canonical, cache = %cache_path.display(), "refreshed repo manifest");
    }

    let repo = RepoDescriptor::load(&cache_path)?;
    for nested in &repo.repos {
        Box::pin(refresh_repo(cache_dir, nested, visited, missing_only)).await?;
    }
    Ok(())
}

/// Refresh every repo registered in the manifest.
pub async fn refresh_repos(
    manifest: &Manifest,
    cache_dir: &Path,
    missing_only: bool,
) -> Result<()> {
    let mut visited = HashSet::new();
    for uri in &manifest.repos {
        refresh_repo(cache_dir, uri, &mut visited, missing_only).await?;
    }
    Ok(())
}

/// The URL (or local path) of a repo's `repo.json`.
fn repo_manifest_location(uri: &str) -> String {
    if uri.ends_with(ObjectKind::Repo.descriptor_file()) {
        uri.to_string()
    } else {
        format!("{}/{}", uri, ObjectKind::Repo.descriptor_file())
    }
}

async fn fetch_repo_manifest(uri: &str) -> Result<Vec<u8>> {
    let location = repo_manifest_location(uri);
    if let Some(stripped) = location.strip_prefix("file://") {
        return read_local(Path::new(stripped), uri);
    }
    if !location.starts_with("http://") && !location.starts_with("https://") {
        return read_local(Path::new(&location), uri);
    }

    let response = reqwest::get(&location).await.map_err(|e| O3deError::RepoFetchError {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    if !response.status().is_success() {
        return Err(O3deError::RepoFetchError {
            uri: uri.to_string(),
            reason: format!("HTTP status {}", response.status()),
        }
        .into());
    }
    let bytes = response.bytes().await.map_err(|e| O3deError::RepoFetchError {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    Ok(bytes.to_vec())
}

fn read_local(path: &Path, uri: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        O3deError::RepoFetchError { uri: uri.to_string(), reason: e.to_string() }.into()
    })
}

/// Search every cached repo manifest for the best gem matching `specifier`.
///
/// Returns the highest satisfying version across all registered repos;
/// first-registered repo wins ties.
pub fn search_cached_gems(
    manifest: &Manifest,
    cache_dir: &Path,
    specifier: &GemSpecifier,
) -> Result<Option<RepoGemEntry>> {
    let mut best: Option<(semver::Version, RepoGemEntry)> = None;

    for uri in &manifest.repos {
        let cache_path = repo_cache_path(cache_dir, uri);
        if !cache_path.is_file() {
            continue;
        }
        let repo = RepoDescriptor::load(&cache_path)?;
        for entry in repo.gems_data {
            if entry.gem_name != specifier.name {
                continue;
            }
            let version = entry
                .version
                .as_deref()
                .and_then(|v| parse_gem_version(v).ok())
                .unwrap_or_else(sentinel_version);
            if !specifier.matches(&version) {
                continue;
            }
            let better = best.as_ref().is_none_or(|(current, _)| version > *current);
            if better {
                best = Some((version, entry));
            }
        }
    }
    Ok(best.map(|(_, entry)| entry))
}

/// Download and extract a gem advertised by a cached repo manifest.
///
/// The archive lands in `<dest_folder>/<gem_name>`; entries with unsafe
/// names are skipped. Returns the extracted gem root.
pub async fn download_gem(
    manifest: &Manifest,
    cache_dir: &Path,
    specifier: &GemSpecifier,
    dest_folder: &Path,
    force: bool,
) -> Result<PathBuf> {
    let entry = search_cached_gems(manifest, cache_dir, specifier)?
        .ok_or_else(|| O3deError::GemNotFound { name: specifier.to_string() })?;
    let source_uri = entry.download_source_uri.clone().ok_or_else(|| {
        O3deError::RepoFetchError {
            uri: specifier.to_string(),
            reason: "repo entry has no download_source_uri".to_string(),
        }
    })?;

    let gem_root = dest_folder.join(&entry.gem_name);
    if gem_root.exists() && !force {
        return Err(anyhow::anyhow!(
            "Destination {} already exists; use --force to overwrite",
            gem_root.display()
        ));
    }

    let bytes = fetch_archive(&source_uri).await?;
    extract_gem_archive(&bytes, &gem_root)?;
    info!(gem = %entry.gem_name, dest = %gem_root.display(), "downloaded gem");
    Ok(gem_root)
}

async fn fetch_archive(uri: &str) -> Result<Vec<u8>> {
    if let Some(stripped) = uri.strip_prefix("file://") {
        return read_local(Path::new(stripped), uri);
    }
    if !uri.starts_with("http://") && !uri.starts_with("https://") {
        return read_local(Path::new(uri), uri);
    }
    let response = reqwest::get(uri).await.map_err(|e| O3deError::RepoFetchError {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    if !response.status().is_success() {
        return Err(O3deError::RepoFetchError {
            uri: uri.to_string(),
            reason: format!("HTTP status {}", response.status()),
        }
        .into());
    }
    Ok(response
        .bytes()
        .await
        .map_err(|e| O3deError::RepoFetchError { uri: uri.to_string(), reason: e.to_string() })?
        .to_vec())
}

fn extract_gem_archive(bytes: &[u8], dest: &Path) -> Result<()> {
    let reader = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(reader).context("Failed to read gem archive (not a zip?)")?;
    ensure_dir(dest)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).context("Failed to read zip entry")?;
        // enclosed_name rejects absolute paths and `..` traversal.
        let Some(relative) = file.enclosed_name() else {
            debug!(entry = %file.name(), "skipping unsafe zip entry");
            continue;
        };
        let out_path = dest.join(relative);
        if file.is_dir() {
            ensure_dir(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                ensure_dir(parent)?;
            }
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)
                .with_context(|| format!("Failed to extract {}", out_path.display()))?;
            atomic_write(&out_path, &contents)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_repo_source(dir: &Path, name: &str, repos: &[&str], gems: serde_json::Value) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join("repo.json"),
            serde_json::json!({"repo_name": name, "repos": repos, "gems_data": gems}).to_string(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_refresh_repo_caches_local_manifest() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        write_repo_source(&source, "community", &[], serde_json::json!([]));
        let cache = temp.path().join("cache");

        let mut visited = HashSet::new();
        refresh_repo(&cache, source.to_str().unwrap(), &mut visited, false).await.unwrap();

        let cached = repo_cache_path(&cache, source.to_str().unwrap());
        assert!(cached.is_file());
        let repo = RepoDescriptor::load(&cached).unwrap();
        assert_eq!(repo.repo_name, "community");
    }

    #[tokio::test]
    async fn test_refresh_repo_recurses_and_survives_cycles() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        // a and b reference each other.
        write_repo_source(&a, "a", &[b.to_str().unwrap()], serde_json::json!([]));
        write_repo_source(&b, "b", &[a.to_str().unwrap()], serde_json::json!([]));
        let cache = temp.path().join("cache");

        let mut visited = HashSet::new();
        refresh_repo(&cache, a.to_str().unwrap(), &mut visited, false).await.unwrap();

        assert!(repo_cache_path(&cache, a.to_str().unwrap()).is_file());
        assert!(repo_cache_path(&cache, b.to_str().unwrap()).is_file());
        assert_eq!(visited.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_missing_only_keeps_cached_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        write_repo_source(&source, "community", &[], serde_json::json!([]));
        let cache = temp.path().join("cache");

        let mut visited = HashSet::new();
        refresh_repo(&cache, source.to_str().unwrap(), &mut visited, false).await.unwrap();
        let cached = repo_cache_path(&cache, source.to_str().unwrap());
        let first = std::fs::read_to_string(&cached).unwrap();

        // Mutate the source; a missing-only refresh must not pick it up.
        write_repo_source(&source, "renamed", &[], serde_json::json!([]));
        let mut visited = HashSet::new();
        refresh_repo(&cache, source.to_str().unwrap(), &mut visited, true).await.unwrap();
        assert_eq!(std::fs::read_to_string(&cached).unwrap(), first);
    }

    #[tokio::test]
    async fn test_refresh_rejects_malformed_manifest() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("repo.json"), "{ nope").unwrap();
        let cache = temp.path().join("cache");

        let mut visited = HashSet::new();
        let err = refresh_repo(&cache, source.to_str().unwrap(), &mut visited, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<O3deError>(),
            Some(O3deError::DescriptorParseError { .. })
        ));
        assert!(!repo_cache_path(&cache, source.to_str().unwrap()).exists());
    }

    #[tokio::test]
    async fn test_search_cached_gems_picks_highest_satisfying() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        write_repo_source(
            &source,
            "community",
            &[],
            serde_json::json!([
                {"gem_name": "gemA", "version": "1.0.0", "download_source_uri": "x"},
                {"gem_name": "gemA", "version": "2.0.0", "download_source_uri": "y"},
                {"gem_name": "gemB", "version": "1.0.0", "download_source_uri": "z"}
            ]),
        );
        let cache = temp.path().join("cache");

        let mut manifest = Manifest::default();
        manifest.repos.push(source.to_string_lossy().into_owned());
        let mut visited = HashSet::new();
        refresh_repo(&cache, source.to_str().unwrap(), &mut visited, false).await.unwrap();

        let spec = GemSpecifier::parse("gemA").unwrap();
        let entry = search_cached_gems(&manifest, &cache, &spec).unwrap().unwrap();
        assert_eq!(entry.version.as_deref(), Some("2.0.0"));

        let spec = GemSpecifier::parse("gemA<2.0.0").unwrap();
        let entry = search_cached_gems(&manifest, &cache, &spec).unwrap().unwrap();
        assert_eq!(entry.version.as_deref(), Some("1.0.0"));

        let spec = GemSpecifier::parse("gemC").unwrap();
        assert!(search_cached_gems(&manifest, &cache, &spec).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_download_gem_extracts_archive() {
        let temp = TempDir::new().unwrap();

        // Build a gem zip with one descriptor and one source file.
        let zip_path = temp.path().join("gemA.zip");
        let file = std::fs::File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("gem.json", options).unwrap();
        writer
            .write_all(br#"{"gem_name": "gemA", "version": "1.0.0"}"#)
            .unwrap();
        writer.start_file("Code/lib.cpp", options).unwrap();
        writer.write_all(b"// gem source\n").unwrap();
        writer.finish().unwrap();

        let source = temp.path().join("source");
        write_repo_source(
            &source,
            "community",
            &[],
            serde_json::json!([{
                "gem_name": "gemA",
                "version": "1.0.0",
                "download_source_uri": zip_path.to_string_lossy()
            }]),
        );
        let cache = temp.path().join("cache");
        let mut manifest = Manifest::default();
        manifest.repos.push(source.to_string_lossy().into_owned());
        let mut visited = HashSet::new();
        refresh_repo(&cache, source.to_str().unwrap(), &mut visited, false).await.unwrap();

        let dest = temp.path().join("gems");
        let spec = GemSpecifier::parse("gemA").unwrap();
        let gem_root = download_gem(&manifest, &cache, &spec, &dest, false).await.unwrap();

        assert_eq!(gem_root, dest.join("gemA"));
        assert!(gem_root.join("gem.json").is_file());
        assert!(gem_root.join("Code/lib.cpp").is_file());

        // Without force, a second download refuses to overwrite.
        assert!(download_gem(&manifest, &cache, &spec, &dest, false).await.is_err());
    }
}
