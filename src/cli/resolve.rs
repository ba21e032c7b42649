//! The `resolve-gem-dependencies` command.
//!
//! Resolves a project's declared `gem_names` (then its engine's) into the
//! `;`-joined `name;path` output file the build consumes. The file is only
//! written on full success.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::Context;
use crate::resolver::{resolve_gem_dependencies, write_resolution_file};
use crate::utils::resolve_absolute;

/// Resolve a project's gem dependencies into an output file.
#[derive(Args)]
pub struct ResolveGemDependenciesCommand {
    /// Project root path
    #[arg(long, value_name = "PATH")]
    project_path: PathBuf,

    /// Engine root path, overriding the project's engine binding
    #[arg(long, value_name = "PATH")]
    engine_path: Option<PathBuf>,

    /// Additional gem search roots (repeatable)
    #[arg(long = "external-subdirectory", value_name = "PATH")]
    external_subdirectories: Vec<PathBuf>,

    /// File to write the name;path list to
    #[arg(long, value_name = "PATH")]
    output_file: PathBuf,
}

impl ResolveGemDependenciesCommand {
    /// Run the resolver and write the output file.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        let project_path = resolve_absolute(&self.project_path, None)?;

        let resolved = resolve_gem_dependencies(
            &manifest,
            &ctx.home,
            &project_path,
            self.engine_path.as_deref(),
            &self.external_subdirectories,
        )?;
        write_resolution_file(&self.output_file, &resolved)?;

        println!(
            "{} Resolved {} gem(s) into {}",
            "✓".green(),
            resolved.len(),
            self.output_file.display()
        );
        Ok(())
    }
}
