//! The `get-registered`, `get-manifest` and `get-engine-projects` commands.
//!
//! Read-only queries over the manifest store; output is the descriptor (or
//! path list) as pretty JSON on stdout so the commands compose with other
//! tooling.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::Context;
use crate::manifest::get_json_data;
use crate::models::ObjectKind;
use crate::registration::get_engine_projects;

/// Look up a registered object by name (or path).
#[derive(Args)]
pub struct GetRegisteredCommand {
    /// Kind of object to look up
    #[arg(long, value_enum)]
    kind: ObjectKind,

    /// Registered name, filesystem path, or repo URI
    #[arg(long, value_name = "NAME")]
    name: String,
}

impl GetRegisteredCommand {
    /// Print the resolved descriptor path and contents.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        let (file, value) = get_json_data(&manifest, self.kind, &self.name, &ctx.cache_dir)?;
        println!("{}", file.display());
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }
}

/// Print the per-user manifest.
#[derive(Args)]
pub struct GetManifestCommand {}

impl GetManifestCommand {
    /// Print the manifest file contents as pretty JSON.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        Ok(())
    }
}

/// List the projects bound to an engine.
#[derive(Args)]
pub struct GetEngineProjectsCommand {
    /// Engine root path
    #[arg(long, value_name = "PATH")]
    engine_path: PathBuf,
}

impl GetEngineProjectsCommand {
    /// Print one project path per line.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        for project in get_engine_projects(&manifest, &self.engine_path)? {
            println!("{}", project.display());
        }
        Ok(())
    }
}
