//! Registration of engines, projects, gems, templates, repos and external
//! subdirectories into the per-user manifest.
//!
//! Registration validates the descriptor under the given path, computes its
//! identity, and inserts the absolutized path into the matching manifest
//! list. Identity keys are unique within their list: re-registering the same
//! identity at a new path replaces the old entry in place when the
//! descriptors match (or `force` is set), and is a conflict otherwise.
//!
//! Validation failures leave the in-memory manifest untouched; callers batch
//! their mutations inside one load/save pair, so a failed call never reaches
//! disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use tracing::debug;

use crate::core::O3deError;
use crate::manifest::Manifest;
use crate::models::{
    EngineDescriptor, ObjectKind, ProjectDescriptor, load_descriptor_value,
};
use crate::utils::{canonical_repo_uri, resolve_absolute, safe_canonicalize};
use crate::version::{GemSpecifier, parse_gem_version, sentinel_version};

/// Scope for an external-subdirectory registration.
#[derive(Debug, Clone)]
pub enum ExternalSubdirScope {
    /// Register into the per-user manifest
    Manifest,
    /// Register into an engine's `engine.json`
    Engine(PathBuf),
    /// Register into a project's `project.json`
    Project(PathBuf),
}

/// Register (or re-register) the object of `kind` rooted at `path`.
///
/// Returns the object's identity name. Gems register into the manifest's
/// external subdirectory list, which is what gem discovery scans.
pub fn register_path(
    manifest: &mut Manifest,
    kind: ObjectKind,
    path: &Path,
    force: bool,
) -> Result<String> {
    let path = safe_canonicalize(path)?;
    let (_, descriptor) = load_descriptor_value(kind, &path)?;
    let identity = identity_of(kind, &descriptor);

    if kind == ObjectKind::Gem {
        // Gems are keyed by (name, version): parallel versions coexist, and
        // discovery dedups by path, so only exact-path duplicates are skipped.
        let list = manifest.paths_for_kind_mut(kind);
        if !list.contains(&path) {
            list.push(path);
        }
        return Ok(identity);
    }

    let mut replace_at: Option<usize> = None;
    for (index, existing_path) in manifest.paths_for_kind(kind).iter().enumerate() {
        let Ok((_, existing)) = load_descriptor_value(kind, existing_path) else {
            continue;
        };
        if identity_of(kind, &existing) != identity {
            continue;
        }
        if existing_path == &path {
            // Same identity at the same path: nothing to do.
            return Ok(identity);
        }
        if !force && existing != descriptor {
            return Err(O3deError::RegistrationConflict { kind: kind.to_string(), name: identity }
                .into());
        }
        replace_at = Some(index);
        break;
    }

    let list = manifest.paths_for_kind_mut(kind);
    match replace_at {
        Some(index) => list[index] = path,
        None => list.push(path),
    }
    Ok(identity)
}

/// Remove the registration of `kind` at `path`.
///
/// Unregistering an engine cascades: manifest entries whose path lies under
/// the engine tree are dropped with it.
pub fn unregister_path(manifest: &mut Manifest, kind: ObjectKind, path: &Path) -> Result<()> {
    let path = safe_canonicalize(path)?;
    let list = manifest.paths_for_kind_mut(kind);
    let before = list.len();
    list.retain(|p| p != &path);
    if list.len() == before {
        return Err(O3deError::DescriptorNotFound {
            kind: kind.to_string(),
            target: path.display().to_string(),
        }
        .into());
    }

    if kind == ObjectKind::Engine {
        manifest.projects.retain(|p| !p.starts_with(&path));
        manifest.templates.retain(|p| !p.starts_with(&path));
        manifest.external_subdirectories.retain(|p| !p.starts_with(&path));
    }
    Ok(())
}

/// Register a repo URI.
pub fn register_repo(manifest: &mut Manifest, uri: &str) -> Result<()> {
    let uri = canonical_repo_uri(uri);
    if uri.is_empty() {
        return Err(O3deError::DescriptorNotFound {
            kind: ObjectKind::Repo.to_string(),
            target: uri,
        }
        .into());
    }
    if !manifest.repos.iter().any(|r| canonical_repo_uri(r) == uri) {
        manifest.repos.push(uri);
    }
    Ok(())
}

/// Remove a repo URI registration.
pub fn unregister_repo(manifest: &mut Manifest, uri: &str) -> Result<()> {
    let uri = canonical_repo_uri(uri);
    let before = manifest.repos.len();
    manifest.repos.retain(|r| canonical_repo_uri(r) != uri);
    if manifest.repos.len() == before {
        return Err(O3deError::DescriptorNotFound {
            kind: ObjectKind::Repo.to_string(),
            target: uri,
        }
        .into());
    }
    Ok(())
}

/// Register an external subdirectory, scoped to the manifest, an engine, or
/// a project.
///
/// Scoped registrations rewrite the owning descriptor file; the manifest is
/// only touched for [`ExternalSubdirScope::Manifest`].
pub fn register_external_subdirectory(
    manifest: &mut Manifest,
    path: &Path,
    scope: &ExternalSubdirScope,
    remove: bool,
) -> Result<()> {
    let path = safe_canonicalize(path)?;
    match scope {
        ExternalSubdirScope::Manifest => {
            if remove {
                let before = manifest.external_subdirectories.len();
                manifest.external_subdirectories.retain(|p| p != &path);
                if manifest.external_subdirectories.len() == before {
                    return Err(O3deError::DescriptorNotFound {
                        kind: "external subdirectory".to_string(),
                        target: path.display().to_string(),
                    }
                    .into());
                }
            } else if !manifest.external_subdirectories.contains(&path) {
                manifest.external_subdirectories.push(path);
            }
            Ok(())
        }
        ExternalSubdirScope::Engine(engine_path) => {
            let engine_path = safe_canonicalize(engine_path)?;
            let mut engine = EngineDescriptor::load(&engine_path)?;
            apply_subdir_edit(&mut engine.external_subdirectories, &engine_path, &path, remove)?;
            engine.save(&engine_path)
        }
        ExternalSubdirScope::Project(project_path) => {
            let project_path = safe_canonicalize(project_path)?;
            let mut project = ProjectDescriptor::load(&project_path)?;
            apply_subdir_edit(&mut project.external_subdirectories, &project_path, &path, remove)?;
            project.save(&project_path)
        }
    }
}

fn apply_subdir_edit(
    subdirs: &mut Vec<String>,
    owner_root: &Path,
    path: &Path,
    remove: bool,
) -> Result<()> {
    // Store relative to the owner when the path is inside its tree, so the
    // descriptor stays relocatable.
    let entry = match path.strip_prefix(owner_root) {
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    };
    if remove {
        let before = subdirs.len();
        subdirs.retain(|existing| existing != &entry);
        if subdirs.len() == before {
            return Err(O3deError::DescriptorNotFound {
                kind: "external subdirectory".to_string(),
                target: entry,
            }
            .into());
        }
    } else if !subdirs.contains(&entry) {
        subdirs.push(entry);
    }
    Ok(())
}

/// Find the first registered engine satisfying `specifier` in manifest
/// order.
///
/// When several engines share the name, manifest order decides; a debug
/// line records that more than one matched.
pub fn find_engine(
    manifest: &Manifest,
    specifier: &GemSpecifier,
) -> Result<(PathBuf, EngineDescriptor)> {
    let mut matched: Option<(PathBuf, EngineDescriptor)> = None;
    let mut match_count = 0usize;

    for engine_path in &manifest.engines {
        let Ok(engine) = EngineDescriptor::load(engine_path) else {
            continue;
        };
        if engine.engine_name != specifier.name {
            continue;
        }
        let version = engine_version(&engine);
        if !specifier.matches(&version) {
            continue;
        }
        match_count += 1;
        if matched.is_none() {
            matched = Some((engine_path.clone(), engine));
        }
    }

    if match_count > 1 {
        debug!(
            engine = %specifier.name,
            matches = match_count,
            "multiple registered engines satisfy the binding; using manifest order"
        );
    }
    matched.ok_or_else(|| O3deError::EngineNotFound { name: specifier.to_string() }.into())
}

/// Resolve a project's `engine` binding to exactly one registered engine.
pub fn resolve_project_engine(
    manifest: &Manifest,
    project: &ProjectDescriptor,
) -> Result<Option<(PathBuf, EngineDescriptor)>> {
    let Some(binding) = project.engine.as_deref() else {
        return Ok(None);
    };
    let specifier = GemSpecifier::parse(binding)
        .with_context(|| format!("Invalid engine binding '{binding}'"))?;
    find_engine(manifest, &specifier).map(Some)
}

/// Registered projects bound to the engine at `engine_path`.
///
/// A project counts when its `engine` binding resolves to this engine, or
/// when it lives under the engine tree without a binding.
pub fn get_engine_projects(manifest: &Manifest, engine_path: &Path) -> Result<Vec<PathBuf>> {
    let engine_path = safe_canonicalize(engine_path)?;
    let mut projects = Vec::new();

    for project_path in &manifest.projects {
        let Ok(project) = ProjectDescriptor::load(project_path) else {
            continue;
        };
        let bound = match resolve_project_engine(manifest, &project)? {
            Some((resolved_path, _)) => resolved_path == engine_path,
            None => project_path.starts_with(&engine_path),
        };
        if bound {
            projects.push(project_path.clone());
        }
    }
    Ok(projects)
}

/// Resolve a project by registered name or path.
pub fn find_project(manifest: &Manifest, target: &str) -> Result<(PathBuf, ProjectDescriptor)> {
    let as_path = Path::new(target);
    if as_path.exists() {
        let mut root = resolve_absolute(as_path, None)?;
        if root.is_file() {
            root = root
                .parent()
                .map(Path::to_path_buf)
                .context("project.json path has no parent directory")?;
        }
        let project = ProjectDescriptor::load(&root)?;
        return Ok((root, project));
    }
    for project_path in &manifest.projects {
        let Ok(project) = ProjectDescriptor::load(project_path) else {
            continue;
        };
        if project.project_name == target {
            return Ok((project_path.clone(), project));
        }
    }
    Err(O3deError::DescriptorNotFound {
        kind: ObjectKind::Project.to_string(),
        target: target.to_string(),
    }
    .into())
}

fn identity_of(kind: ObjectKind, descriptor: &serde_json::Value) -> String {
    let name = descriptor
        .get(kind.identity_field())
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    // Engines are versioned identities: the same name at two versions is two
    // registrations, not a conflict.
    if kind == ObjectKind::Engine {
        if let Some(version) = descriptor.get("version").and_then(|v| v.as_str()) {
            return format!("{name}@{version}");
        }
    }
    name
}

fn engine_version(engine: &EngineDescriptor) -> Version {
    engine
        .version
        .as_deref()
        .and_then(|v| parse_gem_version(v).ok())
        .unwrap_or_else(sentinel_version)
}
