//! The `enable-gem` and `disable-gem` commands.
//!
//! Enabling records the dependency token in the project's `gem_names` and,
//! when the project carries a generated `enabled_gems.cmake`, keeps that
//! list in sync. The gem must resolve against the project's search space
//! before anything is written, so a typo fails the command instead of
//! landing in the descriptor.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::Context;
use crate::cmake::{add_gem_dependency, get_enabled_gems, remove_gem_dependency};
use crate::core::O3deError;
use crate::manifest::Manifest;
use crate::registration::{find_project, resolve_project_engine};
use crate::resolver::{GemIndex, candidate_roots};
use crate::version::GemSpecifier;

/// Default location of the generated enabled-gems file inside a project.
const DEFAULT_ENABLED_GEMS: &str = "Gem/Code/enabled_gems.cmake";

fn enabled_gems_file(project_path: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let default = project_path.join(DEFAULT_ENABLED_GEMS);
    default.exists().then_some(default)
}

fn project_gem_index(
    ctx: &Context,
    manifest: &Manifest,
    project_path: &Path,
    project: &crate::models::ProjectDescriptor,
) -> Result<GemIndex> {
    let engine = resolve_project_engine(manifest, project)?;
    let roots = candidate_roots(
        manifest,
        &ctx.home,
        Some((project_path, project)),
        engine.as_ref().map(|(path, descriptor)| (path.as_path(), descriptor)),
        &[],
    );
    Ok(GemIndex::scan(&roots))
}

/// Enable a gem for a project.
#[derive(Args)]
pub struct EnableGemCommand {
    /// Gem name, optionally with a version specifier (e.g. gemA==1.2.3)
    #[arg(long, value_name = "NAME")]
    gem_name: String,

    /// Project path or registered project name
    #[arg(long, value_name = "PROJECT")]
    project: String,

    /// Enabled-gems CMake file to update (defaults to the project's
    /// generated file when present)
    #[arg(long, value_name = "PATH")]
    enabled_gem_file: Option<PathBuf>,
}

impl EnableGemCommand {
    /// Record the dependency and sync the enabled-gems file.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        let (project_path, mut project) = find_project(&manifest, &self.project)?;
        let specifier = GemSpecifier::parse(&self.gem_name)?;

        // Fail before writing anything if the gem cannot be resolved.
        let index = project_gem_index(ctx, &manifest, &project_path, &project)?;
        let candidate = index.resolve(&specifier)?;
        let resolved_name = candidate.name.clone();

        let already = project
            .gem_names
            .iter()
            .any(|token| {
                GemSpecifier::parse(token).map(|t| t.name == specifier.name).unwrap_or(false)
            });
        if !already {
            project.gem_names.push(self.gem_name.clone());
            project.save(&project_path)?;
        }

        if let Some(file) = enabled_gems_file(&project_path, self.enabled_gem_file.as_deref()) {
            add_gem_dependency(&file, &resolved_name)?;
        }

        println!(
            "{} Enabled gem {} for project {}",
            "✓".green(),
            resolved_name.cyan(),
            project.project_name.cyan()
        );
        Ok(())
    }
}

/// Disable a gem for a project.
#[derive(Args)]
pub struct DisableGemCommand {
    /// Gem name (specifier suffix ignored for matching)
    #[arg(long, value_name = "NAME")]
    gem_name: String,

    /// Project path or registered project name
    #[arg(long, value_name = "PROJECT")]
    project: String,

    /// Enabled-gems CMake file to update
    #[arg(long, value_name = "PATH")]
    enabled_gem_file: Option<PathBuf>,
}

impl DisableGemCommand {
    /// Drop the dependency token and any enabled-gems entry.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        let (project_path, mut project) = find_project(&manifest, &self.project)?;
        let name = GemSpecifier::parse(&self.gem_name)?.name;

        let before = project.gem_names.len();
        project.gem_names.retain(|token| {
            GemSpecifier::parse(token).map(|t| t.name != name).unwrap_or(true)
        });
        let removed_token = project.gem_names.len() != before;
        if removed_token {
            project.save(&project_path)?;
        }

        let mut removed_from_cmake = false;
        if let Some(file) = enabled_gems_file(&project_path, self.enabled_gem_file.as_deref()) {
            if get_enabled_gems(&file)?.contains(&name) {
                remove_gem_dependency(&file, &name)?;
                removed_from_cmake = true;
            }
        }

        if !removed_token && !removed_from_cmake {
            return Err(O3deError::GemNotFound { name }.into());
        }
        println!(
            "{} Disabled gem {} for project {}",
            "✓".green(),
            name.cyan(),
            project.project_name.cyan()
        );
        Ok(())
    }
}
