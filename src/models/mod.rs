//! Descriptor record types for engines, projects, gems, templates and repos.
//!
//! Each registrable object self-describes through a JSON file at its root
//! (`engine.json`, `project.json`, `gem.json`, `template.json`, `repo.json`).
//! The structs here are tolerant readers and round-trip-safe writers:
//! optional fields surface as `Option`/empty collections rather than `null`,
//! and unknown keys are preserved through a flattened map so a rewrite never
//! drops data another tool put there.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::O3deError;
use crate::utils::{read_json_file, write_json_file};

/// The five registrable object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ObjectKind {
    /// A self-describing engine root
    Engine,
    /// A buildable project bound to one engine
    Project,
    /// A reusable gem module
    Gem,
    /// A source tree template for project/gem creation
    Template,
    /// A remote manifest of downloadable gems
    Repo,
}

impl ObjectKind {
    /// Descriptor file name for this kind.
    #[must_use]
    pub const fn descriptor_file(self) -> &'static str {
        match self {
            Self::Engine => "engine.json",
            Self::Project => "project.json",
            Self::Gem => "gem.json",
            Self::Template => "template.json",
            Self::Repo => "repo.json",
        }
    }

    /// Name of the identity field inside the descriptor file.
    #[must_use]
    pub const fn identity_field(self) -> &'static str {
        match self {
            Self::Engine => "engine_name",
            Self::Project => "project_name",
            Self::Gem => "gem_name",
            Self::Template => "template_name",
            Self::Repo => "repo_name",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Engine => "engine",
            Self::Project => "project",
            Self::Gem => "gem",
            Self::Template => "template",
            Self::Repo => "repo",
        };
        f.write_str(label)
    }
}

/// Resolve the descriptor file path for `kind` under `target`.
///
/// `target` may be the object's root directory or the descriptor file
/// itself.
#[must_use]
pub fn descriptor_path(kind: ObjectKind, target: &Path) -> PathBuf {
    if target.is_dir() {
        target.join(kind.descriptor_file())
    } else {
        target.to_path_buf()
    }
}

/// Load a descriptor as an untyped JSON object, verifying the identity field.
///
/// Returns the descriptor file path alongside the parsed value. Used by the
/// manifest store's name-or-path lookup and by the `get-registered` output.
pub fn load_descriptor_value(kind: ObjectKind, target: &Path) -> Result<(PathBuf, serde_json::Value)> {
    let file = descriptor_path(kind, target);
    let content = std::fs::read_to_string(&file).map_err(|_| O3deError::DescriptorNotFound {
        kind: kind.to_string(),
        target: target.display().to_string(),
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| O3deError::DescriptorParseError {
            file: file.display().to_string(),
            reason: e.to_string(),
        })?;

    let identity = value.get(kind.identity_field()).and_then(|v| v.as_str());
    if identity.is_none_or(str::is_empty) {
        return Err(O3deError::MissingRequiredField {
            file: file.display().to_string(),
            field: kind.identity_field().to_string(),
        }
        .into());
    }
    Ok((file, value))
}

fn load_descriptor<T: serde::de::DeserializeOwned>(kind: ObjectKind, target: &Path) -> Result<T> {
    let file = descriptor_path(kind, target);
    if !file.is_file() {
        return Err(O3deError::DescriptorNotFound {
            kind: kind.to_string(),
            target: target.display().to_string(),
        }
        .into());
    }
    read_json_file(&file).map_err(|e| {
        O3deError::DescriptorParseError {
            file: file.display().to_string(),
            reason: e.root_cause().to_string(),
        }
        .into()
    })
}

fn require_identity(file: &Path, field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(O3deError::MissingRequiredField {
            file: file.display().to_string(),
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Contents of an `engine.json` descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineDescriptor {
    /// Identity key, unique among registered engines
    #[serde(default)]
    pub engine_name: String,

    /// Optional engine version, dotted integers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Paths the engine contributes to gem discovery; relative entries
    /// resolve against the engine root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_subdirectories: Vec<String>,

    /// Gem dependency tokens the engine itself declares
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gem_names: Vec<String>,

    /// Unknown keys, preserved verbatim on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EngineDescriptor {
    /// Load and validate `engine.json` under `target` (directory or file).
    pub fn load(target: &Path) -> Result<Self> {
        let descriptor: Self = load_descriptor(ObjectKind::Engine, target)?;
        require_identity(
            &descriptor_path(ObjectKind::Engine, target),
            ObjectKind::Engine.identity_field(),
            &descriptor.engine_name,
        )?;
        Ok(descriptor)
    }

    /// Rewrite `engine.json` in `root` atomically.
    pub fn save(&self, root: &Path) -> Result<()> {
        write_json_file(&root.join(ObjectKind::Engine.descriptor_file()), self)
    }
}

/// Contents of a `project.json` descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectDescriptor {
    /// Identity key, unique among registered projects
    #[serde(default)]
    pub project_name: String,

    /// Optional project version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Engine binding: `NAME` or `NAME OP VERSION`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,

    /// Gem dependency tokens, possibly carrying version specifiers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gem_names: Vec<String>,

    /// Paths the project contributes to gem discovery
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_subdirectories: Vec<String>,

    /// Unknown keys, preserved verbatim on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProjectDescriptor {
    /// Load and validate `project.json` under `target` (directory or file).
    pub fn load(target: &Path) -> Result<Self> {
        let descriptor: Self = load_descriptor(ObjectKind::Project, target)?;
        require_identity(
            &descriptor_path(ObjectKind::Project, target),
            ObjectKind::Project.identity_field(),
            &descriptor.project_name,
        )?;
        Ok(descriptor)
    }

    /// Rewrite `project.json` in `root` atomically.
    pub fn save(&self, root: &Path) -> Result<()> {
        write_json_file(&root.join(ObjectKind::Project.descriptor_file()), self)
    }
}

/// Contents of a `gem.json` descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GemDescriptor {
    /// Identity key; gems sharing a name are distinguished by version
    #[serde(default)]
    pub gem_name: String,

    /// Optional gem version; absent orders below every explicit version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Gem dependency tokens this gem declares (expanded by the build
    /// system, not by this resolver)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Unknown keys, preserved verbatim on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GemDescriptor {
    /// Load and validate `gem.json` under `target` (directory or file).
    pub fn load(target: &Path) -> Result<Self> {
        let descriptor: Self = load_descriptor(ObjectKind::Gem, target)?;
        require_identity(
            &descriptor_path(ObjectKind::Gem, target),
            ObjectKind::Gem.identity_field(),
            &descriptor.gem_name,
        )?;
        Ok(descriptor)
    }

    /// Rewrite `gem.json` in `root` atomically.
    pub fn save(&self, root: &Path) -> Result<()> {
        write_json_file(&root.join(ObjectKind::Gem.descriptor_file()), self)
    }
}

/// Contents of a `template.json` descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplateDescriptor {
    /// Identity key, unique among registered templates
    #[serde(default)]
    pub template_name: String,

    /// Unknown keys, preserved verbatim on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TemplateDescriptor {
    /// Load and validate `template.json` under `target` (directory or file).
    pub fn load(target: &Path) -> Result<Self> {
        let descriptor: Self = load_descriptor(ObjectKind::Template, target)?;
        require_identity(
            &descriptor_path(ObjectKind::Template, target),
            ObjectKind::Template.identity_field(),
            &descriptor.template_name,
        )?;
        Ok(descriptor)
    }
}

/// One downloadable gem advertised by a repo manifest.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RepoGemEntry {
    /// Gem identity
    #[serde(default)]
    pub gem_name: String,

    /// Advertised version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// URI of the gem's zip archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_source_uri: Option<String>,

    /// Unknown keys, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Contents of a `repo.json` manifest.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RepoDescriptor {
    /// Identity key
    #[serde(default)]
    pub repo_name: String,

    /// Canonical URI the manifest was published at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// URIs of further repos to refresh recursively
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repos: Vec<String>,

    /// Gems advertised by this repo
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gems_data: Vec<RepoGemEntry>,

    /// Unknown keys, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RepoDescriptor {
    /// Load and validate a cached `repo.json` at `target` (directory or file).
    pub fn load(target: &Path) -> Result<Self> {
        let descriptor: Self = load_descriptor(ObjectKind::Repo, target)?;
        require_identity(
            &descriptor_path(ObjectKind::Repo, target),
            ObjectKind::Repo.identity_field(),
            &descriptor.repo_name,
        )?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_descriptor_path_for_directory_and_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        assert_eq!(descriptor_path(ObjectKind::Engine, dir), dir.join("engine.json"));

        let file = dir.join("custom.json");
        assert_eq!(descriptor_path(ObjectKind::Engine, &file), file);
    }

    #[test]
    fn test_gem_descriptor_load_validates_identity() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("gem.json"), r#"{"version": "1.0.0"}"#).unwrap();

        let err = GemDescriptor::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("gem_name"));
    }

    #[test]
    fn test_project_descriptor_round_trip_keeps_unknown_keys() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("project.json"),
            r#"{"project_name": "Shooter", "display_name": "My Shooter", "gem_names": ["gemA"]}"#,
        )
        .unwrap();

        let mut descriptor = ProjectDescriptor::load(temp.path()).unwrap();
        descriptor.gem_names.push("gemB".to_string());
        descriptor.save(temp.path()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(temp.path().join("project.json")).unwrap())
                .unwrap();
        assert_eq!(value["display_name"], "My Shooter");
        assert_eq!(value["gem_names"], serde_json::json!(["gemA", "gemB"]));
    }

    #[test]
    fn test_load_descriptor_value_rejects_malformed_json() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("engine.json"), "{ nope").unwrap();

        let err = load_descriptor_value(ObjectKind::Engine, temp.path()).unwrap_err();
        assert!(err.downcast_ref::<crate::core::O3deError>().is_some());
    }

    #[test]
    fn test_repo_descriptor_parses_gems_data() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("repo.json"),
            r#"{
                "repo_name": "community",
                "repos": ["https://example.com/more"],
                "gems_data": [
                    {"gem_name": "gemA", "version": "1.2.3",
                     "download_source_uri": "https://example.com/gemA-1.2.3.zip"}
                ]
            }"#,
        )
        .unwrap();

        let repo = RepoDescriptor::load(temp.path()).unwrap();
        assert_eq!(repo.repos.len(), 1);
        assert_eq!(repo.gems_data[0].gem_name, "gemA");
    }
}
