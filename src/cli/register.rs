//! The `register` command.
//!
//! One target flag selects what is being (un)registered; `--remove` flips
//! the direction and `--force` overrides a registration conflict. External
//! subdirectories may be scoped to an engine or a project, in which case
//! the owning descriptor file is rewritten instead of the manifest.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;

use super::Context;
use crate::models::ObjectKind;
use crate::registration::{
    ExternalSubdirScope, register_external_subdirectory, register_path, register_repo,
    unregister_path, unregister_repo,
};

/// Register or unregister engines, projects, gems, templates, repos and
/// external subdirectories.
#[derive(Args)]
pub struct RegisterCommand {
    /// Path of an engine root to register
    #[arg(long, value_name = "PATH", group = "target")]
    engine_path: Option<PathBuf>,

    /// Path of a project root to register
    #[arg(long, value_name = "PATH", group = "target")]
    project_path: Option<PathBuf>,

    /// Path of a gem root to register
    #[arg(long, value_name = "PATH", group = "target")]
    gem_path: Option<PathBuf>,

    /// Path of a template root to register
    #[arg(long, value_name = "PATH", group = "target")]
    template_path: Option<PathBuf>,

    /// URI of a repo to register
    #[arg(long, value_name = "URI", group = "target")]
    repo_uri: Option<String>,

    /// Path to contribute to gem discovery
    #[arg(long, value_name = "PATH", group = "target")]
    external_subdirectory: Option<PathBuf>,

    /// Scope the external subdirectory to this engine's engine.json
    #[arg(long, value_name = "PATH", requires = "external_subdirectory")]
    external_subdirectory_engine_path: Option<PathBuf>,

    /// Scope the external subdirectory to this project's project.json
    #[arg(long, value_name = "PATH", requires = "external_subdirectory")]
    external_subdirectory_project_path: Option<PathBuf>,

    /// Remove the registration instead of adding it
    #[arg(long)]
    remove: bool,

    /// Replace a conflicting registration
    #[arg(long)]
    force: bool,
}

impl RegisterCommand {
    /// Run the registration against the per-user manifest.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let mut manifest = ctx.load_manifest()?;

        if let Some(uri) = &self.repo_uri {
            if self.remove {
                unregister_repo(&mut manifest, uri)?;
            } else {
                register_repo(&mut manifest, uri)?;
            }
            ctx.save_manifest(&manifest)?;
            self.report("repo", uri);
            return Ok(());
        }

        if let Some(path) = &self.external_subdirectory {
            let scope = if let Some(engine) = &self.external_subdirectory_engine_path {
                ExternalSubdirScope::Engine(engine.clone())
            } else if let Some(project) = &self.external_subdirectory_project_path {
                ExternalSubdirScope::Project(project.clone())
            } else {
                ExternalSubdirScope::Manifest
            };
            register_external_subdirectory(&mut manifest, path, &scope, self.remove)?;
            ctx.save_manifest(&manifest)?;
            self.report("external subdirectory", &path.display().to_string());
            return Ok(());
        }

        let (kind, path) = if let Some(path) = &self.engine_path {
            (ObjectKind::Engine, path)
        } else if let Some(path) = &self.project_path {
            (ObjectKind::Project, path)
        } else if let Some(path) = &self.gem_path {
            (ObjectKind::Gem, path)
        } else if let Some(path) = &self.template_path {
            (ObjectKind::Template, path)
        } else {
            return Err(anyhow!(
                "Nothing to register: pass one of --engine-path, --project-path, --gem-path, \
                 --template-path, --repo-uri or --external-subdirectory"
            ));
        };

        if self.remove {
            unregister_path(&mut manifest, kind, path)?;
        } else {
            register_path(&mut manifest, kind, path, self.force)?;
        }
        ctx.save_manifest(&manifest)?;
        self.report(&kind.to_string(), &path.display().to_string());
        Ok(())
    }

    fn report(&self, kind: &str, target: &str) {
        let verb = if self.remove { "Unregistered" } else { "Registered" };
        println!("{} {} {}", "✓".green(), verb, format!("{kind} {target}").cyan());
    }
}
