//! The per-user manifest store (`o3de_manifest.json`).
//!
//! The manifest is the single registry of known engines, projects, external
//! subdirectories, templates and repos on a machine. It lives at
//! `~/.o3de/o3de_manifest.json` (overridable with `--override-home-folder`)
//! and is created lazily: loading a missing file yields an empty skeleton,
//! and the first save creates the `.o3de` folder.
//!
//! Mutation follows an explicit load / mutate / save cycle; there is no
//! process-wide singleton. Saves go through write-temp-then-rename, so
//! concurrent readers never see a torn file; cross-process writers are
//! last-writer-wins by design.
//!
//! Unknown keys round-trip untouched via the flattened `extra` map, keeping
//! the file safe to share with other tools that annotate it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::O3deError;
use crate::models::{ObjectKind, load_descriptor_value};
use crate::utils::{canonical_repo_uri, repo_cache_file_name, write_json_file};

/// File name of the per-user manifest.
pub const MANIFEST_FILE: &str = "o3de_manifest.json";

/// Folder under the user's home that owns the manifest and caches.
pub const HOME_FOLDER: &str = ".o3de";

/// The per-user `o3de_manifest.json` contents.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Manifest {
    /// Manifest identity; defaults to the host user's name on first save
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub o3de_manifest_name: String,

    /// Registered engine root paths
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub engines: Vec<PathBuf>,

    /// Registered project root paths
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<PathBuf>,

    /// Registered gem/search roots; explicit gem registration lands here
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_subdirectories: Vec<PathBuf>,

    /// Registered template root paths
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<PathBuf>,

    /// Registered repo URIs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repos: Vec<String>,

    /// Default folder for engines created/downloaded by this tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_engines_folder: Option<PathBuf>,

    /// Default folder for created projects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_projects_folder: Option<PathBuf>,

    /// Default folder for downloaded gems; scanned during gem discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_gems_folder: Option<PathBuf>,

    /// Default folder for templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_templates_folder: Option<PathBuf>,

    /// Default folder for third-party artifacts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_third_party_folder: Option<PathBuf>,

    /// Unknown keys, preserved verbatim on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    /// Load the manifest at `path`.
    ///
    /// A missing file is not an error: the empty skeleton is returned so
    /// first-run commands work without an init step. Malformed JSON is a
    /// parse error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest: Self =
            serde_json::from_str(&content).map_err(|e| O3deError::ManifestParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(manifest)
    }

    /// Atomically rewrite the manifest at `path`, creating parents as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_file(path, self)
            .with_context(|| format!("Failed to save manifest {}", path.display()))
    }

    /// The manifest list that owns registrations of `kind`.
    ///
    /// Gems register as external subdirectories; repos live in their own
    /// URI list and are not path-keyed.
    #[must_use]
    pub fn paths_for_kind(&self, kind: ObjectKind) -> &Vec<PathBuf> {
        match kind {
            ObjectKind::Engine => &self.engines,
            ObjectKind::Project => &self.projects,
            ObjectKind::Gem => &self.external_subdirectories,
            ObjectKind::Template => &self.templates,
            ObjectKind::Repo => {
                unreachable!("repos are registered by URI, not path")
            }
        }
    }

    /// Mutable variant of [`Manifest::paths_for_kind`].
    pub fn paths_for_kind_mut(&mut self, kind: ObjectKind) -> &mut Vec<PathBuf> {
        match kind {
            ObjectKind::Engine => &mut self.engines,
            ObjectKind::Project => &mut self.projects,
            ObjectKind::Gem => &mut self.external_subdirectories,
            ObjectKind::Template => &mut self.templates,
            ObjectKind::Repo => {
                unreachable!("repos are registered by URI, not path")
            }
        }
    }

    /// Default folder for downloaded gems, falling back to `<home>/O3DE/Gems`.
    #[must_use]
    pub fn gems_folder(&self, home: &Path) -> PathBuf {
        self.default_gems_folder
            .clone()
            .unwrap_or_else(|| home.join("O3DE").join("Gems"))
    }

    /// Default folder for created projects, falling back to
    /// `<home>/O3DE/Projects`.
    #[must_use]
    pub fn projects_folder(&self, home: &Path) -> PathBuf {
        self.default_projects_folder
            .clone()
            .unwrap_or_else(|| home.join("O3DE").join("Projects"))
    }
}

/// Resolve the user's home directory, honoring the CLI override.
pub fn home_folder(override_home: Option<&Path>) -> Result<PathBuf> {
    if let Some(home) = override_home {
        return Ok(home.to_path_buf());
    }
    dirs::home_dir().context("Could not determine the user's home directory")
}

/// Path of the `.o3de` folder that owns the manifest and caches.
pub fn o3de_folder(override_home: Option<&Path>) -> Result<PathBuf> {
    Ok(home_folder(override_home)?.join(HOME_FOLDER))
}

/// Path of the per-user manifest file.
pub fn manifest_path(override_home: Option<&Path>) -> Result<PathBuf> {
    Ok(o3de_folder(override_home)?.join(MANIFEST_FILE))
}

/// Path of the repo manifest cache folder.
pub fn cache_folder(override_home: Option<&Path>) -> Result<PathBuf> {
    Ok(o3de_folder(override_home)?.join("cache"))
}

/// Resolve a descriptor of `kind` by registered name or filesystem path.
///
/// A `target` that exists on disk wins; otherwise the registered entries of
/// that kind are scanned for a matching identity. Repo targets are URIs and
/// resolve through the local cache.
pub fn get_json_data(
    manifest: &Manifest,
    kind: ObjectKind,
    target: &str,
    cache_dir: &Path,
) -> Result<(PathBuf, serde_json::Value)> {
    if kind == ObjectKind::Repo {
        let uri = canonical_repo_uri(target);
        let cached = cache_dir.join(repo_cache_file_name(&uri));
        if cached.is_file() {
            return load_descriptor_value(kind, &cached);
        }
        return Err(O3deError::DescriptorNotFound {
            kind: kind.to_string(),
            target: target.to_string(),
        }
        .into());
    }

    let as_path = Path::new(target);
    if as_path.exists() {
        return load_descriptor_value(kind, as_path);
    }

    for registered in manifest.paths_for_kind(kind) {
        let Ok((file, value)) = load_descriptor_value(kind, registered) else {
            continue;
        };
        if value.get(kind.identity_field()).and_then(|v| v.as_str()) == Some(target) {
            return Ok((file, value));
        }
    }

    Err(O3deError::DescriptorNotFound { kind: kind.to_string(), target: target.to_string() }
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_manifest_returns_skeleton() {
        let temp = TempDir::new().unwrap();
        let manifest = Manifest::load(&temp.path().join(MANIFEST_FILE)).unwrap();
        assert!(manifest.engines.is_empty());
        assert!(manifest.repos.is_empty());
    }

    #[test]
    fn test_load_malformed_manifest_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        std::fs::write(&path, "{ broken").unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<O3deError>(),
            Some(O3deError::ManifestParseError { .. })
        ));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub").join(MANIFEST_FILE);

        let mut manifest = Manifest::default();
        manifest.engines.push(PathBuf::from("/tmp/eng"));
        manifest.repos.push("https://example.com/repo".to_string());
        manifest
            .extra
            .insert("annotation".to_string(), serde_json::json!({"by": "another tool"}));
        manifest.save(&path).unwrap();

        let reloaded = Manifest::load(&path).unwrap();
        assert_eq!(reloaded, manifest);
    }

    #[test]
    fn test_get_json_data_by_path_and_by_name() {
        let temp = TempDir::new().unwrap();
        let engine_dir = temp.path().join("eng");
        std::fs::create_dir(&engine_dir).unwrap();
        std::fs::write(
            engine_dir.join("engine.json"),
            r#"{"engine_name": "o3de", "version": "1.0.0"}"#,
        )
        .unwrap();

        let mut manifest = Manifest::default();
        manifest.engines.push(engine_dir.clone());
        let cache = temp.path().join("cache");

        let (_, by_path) = get_json_data(
            &manifest,
            ObjectKind::Engine,
            engine_dir.to_str().unwrap(),
            &cache,
        )
        .unwrap();
        assert_eq!(by_path["engine_name"], "o3de");

        let (file, by_name) = get_json_data(&manifest, ObjectKind::Engine, "o3de", &cache).unwrap();
        assert_eq!(by_name["version"], "1.0.0");
        assert!(file.ends_with("engine.json"));
    }

    #[test]
    fn test_get_json_data_unresolvable_target_fails() {
        let temp = TempDir::new().unwrap();
        let manifest = Manifest::default();

        let err = get_json_data(&manifest, ObjectKind::Project, "nope", temp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<O3deError>(),
            Some(O3deError::DescriptorNotFound { .. })
        ));
    }
}
