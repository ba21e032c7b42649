//! Gem dependency resolution.
//!
//! Given a project (and its engine), the resolver turns the declared
//! `gem_names` tokens into an ordered list of `name;path` pairs:
//!
//! 1. Candidate gems are collected from the union of the project's external
//!    subdirectories, the engine's external subdirectories, the manifest's
//!    registered gem roots, and the default gems folder where downloaded
//!    gems land. Every `gem.json` found under those roots becomes a
//!    candidate, indexed by `gem_name` in first-seen order.
//! 2. Each token resolves to the candidate with the highest version
//!    satisfying its predicate; a version-less candidate orders below every
//!    explicit version. No candidate means the whole resolution fails,
//!    naming the token.
//! 3. Duplicate names are emitted once, at their first resolution. The
//!    resolver never recurses into a gem's own dependencies; transitive
//!    expansion belongs to the build system.
//!
//! The output file is the build's sole authority for enabled gem paths, so
//! it is written atomically and only on full success.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::O3deError;
use crate::manifest::Manifest;
use crate::models::{EngineDescriptor, GemDescriptor, ObjectKind, ProjectDescriptor};
use crate::registration::resolve_project_engine;
use crate::utils::atomic_write;
use crate::version::{GemSpecifier, parse_gem_version, sentinel_version};

/// One discovered gem: identity, parsed version, and root path.
#[derive(Debug, Clone)]
pub struct GemCandidate {
    /// The gem's identity
    pub name: String,
    /// Parsed version; `None` for version-less gems
    pub version: Option<Version>,
    /// The gem's root directory
    pub path: PathBuf,
    /// The parsed descriptor
    pub descriptor: GemDescriptor,
}

impl GemCandidate {
    /// The version this candidate compares as under a predicate.
    #[must_use]
    pub fn effective_version(&self) -> Version {
        self.version.clone().unwrap_or_else(sentinel_version)
    }
}

/// Multimap of gem name to candidates, preserving first-seen order.
#[derive(Debug, Default)]
pub struct GemIndex {
    by_name: HashMap<String, Vec<GemCandidate>>,
    seen_paths: HashSet<PathBuf>,
}

impl GemIndex {
    /// Build an index by scanning every root for `gem.json` descriptors.
    ///
    /// Unreadable descriptors are skipped with a debug line; a broken gem in
    /// one corner of the search space must not break unrelated resolution.
    pub fn scan(roots: &[PathBuf]) -> Self {
        let mut index = Self::default();
        for root in roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "skipping missing gem search root");
                continue;
            }
            for entry in WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_map(std::result::Result::ok)
            {
                if entry.file_type().is_file()
                    && entry.file_name().to_str() == Some(ObjectKind::Gem.descriptor_file())
                {
                    let gem_root = entry.path().parent().unwrap_or(root).to_path_buf();
                    index.insert_gem_root(&gem_root);
                }
            }
        }
        index
    }

    fn insert_gem_root(&mut self, gem_root: &Path) {
        if !self.seen_paths.insert(gem_root.to_path_buf()) {
            return;
        }
        let descriptor = match GemDescriptor::load(gem_root) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                debug!(path = %gem_root.display(), %error, "skipping unreadable gem.json");
                return;
            }
        };
        let version = match descriptor.version.as_deref() {
            Some(raw) => match parse_gem_version(raw) {
                Ok(version) => Some(version),
                Err(error) => {
                    debug!(path = %gem_root.display(), %error, "skipping gem with bad version");
                    return;
                }
            },
            None => None,
        };
        self.by_name.entry(descriptor.gem_name.clone()).or_default().push(GemCandidate {
            name: descriptor.gem_name.clone(),
            version,
            path: gem_root.to_path_buf(),
            descriptor,
        });
    }

    /// Candidates for `name`, in first-seen order.
    #[must_use]
    pub fn candidates(&self, name: &str) -> &[GemCandidate] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct gem roots discovered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen_paths.len()
    }

    /// Whether the index found no gems at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen_paths.is_empty()
    }

    /// Resolve one dependency token against the index.
    ///
    /// Picks the highest effective version satisfying the specifier; ties
    /// between distinct paths are broken by first-seen order, with a
    /// warning, since they indicate duplicate gems on the search path.
    pub fn resolve(&self, specifier: &GemSpecifier) -> Result<&GemCandidate> {
        let satisfying: Vec<&GemCandidate> = self
            .candidates(&specifier.name)
            .iter()
            .filter(|candidate| specifier.matches(&candidate.effective_version()))
            .collect();

        let Some(best) = satisfying
            .iter()
            .copied()
            .max_by(|a, b| a.effective_version().cmp(&b.effective_version()))
        else {
            return Err(
                O3deError::UnresolvedDependency { token: specifier.to_string() }.into()
            );
        };

        // max_by returns the last maximum; re-select the first seen at the
        // winning version so ordering stays deterministic.
        let winning = best.effective_version();
        let mut at_best = satisfying
            .iter()
            .copied()
            .filter(|candidate| candidate.effective_version() == winning);
        let first = at_best.next().unwrap_or(best);
        if at_best.next().is_some() {
            warn!(
                gem = %specifier.name,
                version = %winning,
                path = %first.path.display(),
                "multiple gems satisfy the dependency at the same version; using first seen"
            );
        }
        Ok(first)
    }
}

/// A resolved dependency: name plus the chosen gem root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGem {
    /// Gem identity
    pub name: String,
    /// Chosen gem root path
    pub path: PathBuf,
}

/// The roots gem discovery scans for a project/engine pair.
///
/// Relative external subdirectories resolve against their descriptor's
/// directory. Missing roots are tolerated and skipped at scan time.
#[must_use]
pub fn candidate_roots(
    manifest: &Manifest,
    home: &Path,
    project: Option<(&Path, &ProjectDescriptor)>,
    engine: Option<(&Path, &EngineDescriptor)>,
    extra_subdirectories: &[PathBuf],
) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    let mut push = |root: PathBuf| {
        if !roots.contains(&root) {
            roots.push(root);
        }
    };

    if let Some((project_path, project)) = project {
        push(project_path.to_path_buf());
        for subdir in &project.external_subdirectories {
            push(resolve_against(project_path, subdir));
        }
    }
    if let Some((engine_path, engine)) = engine {
        push(engine_path.to_path_buf());
        for subdir in &engine.external_subdirectories {
            push(resolve_against(engine_path, subdir));
        }
    }
    for subdir in &manifest.external_subdirectories {
        push(subdir.clone());
    }
    push(manifest.gems_folder(home));
    for subdir in extra_subdirectories {
        push(subdir.clone());
    }
    roots
}

fn resolve_against(base: &Path, entry: &str) -> PathBuf {
    let entry = Path::new(entry);
    if entry.is_absolute() {
        entry.to_path_buf()
    } else {
        base.join(entry)
    }
}

/// Resolve the gem dependencies of the project at `project_path`.
///
/// Tokens are taken from the project's `gem_names` first, then the bound
/// engine's, deduplicated by gem name on first resolution. The engine
/// binding must resolve to exactly one registered engine when present;
/// `engine_path` overrides the binding.
pub fn resolve_gem_dependencies(
    manifest: &Manifest,
    home: &Path,
    project_path: &Path,
    engine_path: Option<&Path>,
    extra_subdirectories: &[PathBuf],
) -> Result<Vec<ResolvedGem>> {
    let project = ProjectDescriptor::load(project_path)?;

    let engine: Option<(PathBuf, EngineDescriptor)> = match engine_path {
        Some(path) => Some((path.to_path_buf(), EngineDescriptor::load(path)?)),
        None => resolve_project_engine(manifest, &project)?,
    };

    let roots = candidate_roots(
        manifest,
        home,
        Some((project_path, &project)),
        engine.as_ref().map(|(path, descriptor)| (path.as_path(), descriptor)),
        extra_subdirectories,
    );
    let index = GemIndex::scan(&roots);
    debug!(gems = index.len(), roots = roots.len(), "indexed gem candidates");

    let mut tokens: Vec<&str> = project.gem_names.iter().map(String::as_str).collect();
    if let Some((_, engine)) = &engine {
        tokens.extend(engine.gem_names.iter().map(String::as_str));
    }

    let mut resolved = Vec::new();
    let mut emitted: HashSet<String> = HashSet::new();
    for token in tokens {
        let specifier = GemSpecifier::parse(token)?;
        if !emitted.insert(specifier.name.clone()) {
            continue;
        }
        let candidate = index.resolve(&specifier)?;
        resolved.push(ResolvedGem { name: candidate.name.clone(), path: candidate.path.clone() });
    }
    Ok(resolved)
}

/// Write the resolver output file: one line of `;`-joined `name;path` pairs.
///
/// The write is atomic; on failure the file is left untouched. An empty
/// resolution writes an empty string.
pub fn write_resolution_file(output: &Path, resolved: &[ResolvedGem]) -> Result<()> {
    let line = resolved
        .iter()
        .map(|gem| format!("{};{}", gem.name, gem.path.display()))
        .collect::<Vec<_>>()
        .join(";");
    atomic_write(output, line.as_bytes())
        .with_context(|| format!("Failed to write resolver output {}", output.display()))
}
