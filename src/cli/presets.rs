//! The `update-cmake-presets` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::Context;
use crate::cmake::{UpdatePresetResult, update_cmake_presets_for_project};
use crate::models::ProjectDescriptor;
use crate::registration::{find_engine, resolve_project_engine};
use crate::utils::resolve_absolute;
use crate::version::GemSpecifier;

/// Stitch the bound engine's CMake preset into a project.
#[derive(Args)]
pub struct UpdateCmakePresetsCommand {
    /// Project root path
    #[arg(long, value_name = "PATH")]
    project_path: PathBuf,

    /// Engine name (with optional specifier), overriding the project's
    /// engine binding
    #[arg(long, value_name = "ENGINE")]
    engine_name: Option<String>,
}

impl UpdateCmakePresetsCommand {
    /// Resolve the engine and stitch its preset file in.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        let project_path = resolve_absolute(&self.project_path, None)?;

        let engine_path = match &self.engine_name {
            Some(name) => {
                let specifier = GemSpecifier::parse(name)?;
                find_engine(&manifest, &specifier)?.0
            }
            None => {
                let project = ProjectDescriptor::load(&project_path)?;
                resolve_project_engine(&manifest, &project)?
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "Project has no engine binding; pass --engine-name"
                        )
                    })?
                    .0
            }
        };

        match update_cmake_presets_for_project(&project_path, &engine_path)? {
            UpdatePresetResult::EnginePathAdded => {
                println!("{} Added engine preset to project includes", "✓".green());
            }
            UpdatePresetResult::EnginePathAlreadyIncluded => {
                println!("{} Engine preset already included", "✓".green());
            }
        }
        Ok(())
    }
}
