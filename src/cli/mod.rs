//! Command-line interface.
//!
//! Each subcommand family lives in its own module with a clap `Args` struct
//! and an `execute` method. Commands follow one shape: resolve the per-user
//! context (home folder, manifest path, cache folder), load the manifest,
//! perform the transformation, save, and print a short confirmation.
//! Failures abort the command; `main` maps any error to exit code 1.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod create;
pub mod edit;
pub mod gems;
pub mod list;
pub mod presets;
pub mod register;
pub mod repo;
pub mod resolve;

use crate::manifest::{Manifest, cache_folder, home_folder, manifest_path};

/// Engine, project and gem registration with versioned gem dependency
/// resolution.
#[derive(Parser)]
#[command(name = "o3de", version, about)]
pub struct Cli {
    /// Use this folder instead of the user's home for the .o3de data root
    #[arg(long, global = true, value_name = "PATH")]
    pub override_home_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register or unregister engines, projects, gems, templates, repos and
    /// external subdirectories
    Register(register::RegisterCommand),

    /// Create a project from a template
    CreateProject(create::CreateProjectCommand),

    /// Create a gem from a template
    CreateGem(create::CreateGemCommand),

    /// Instantiate any registered template at a destination
    CreateFromTemplate(create::CreateFromTemplateCommand),

    /// Enable a gem for a project
    EnableGem(gems::EnableGemCommand),

    /// Disable a gem for a project
    DisableGem(gems::DisableGemCommand),

    /// Edit fields of a project.json
    EditProjectProperties(edit::EditProjectPropertiesCommand),

    /// Edit fields of an engine.json
    EditEngineProperties(edit::EditEnginePropertiesCommand),

    /// Edit fields of a gem.json
    EditGemProperties(edit::EditGemPropertiesCommand),

    /// Download a gem advertised by a registered repo
    DownloadGem(repo::DownloadGemCommand),

    /// Refresh one repo's cached manifest
    RefreshRepo(repo::RefreshRepoCommand),

    /// Refresh every registered repo's cached manifest
    RefreshAllRepos(repo::RefreshAllReposCommand),

    /// Look up a registered object by name
    GetRegistered(list::GetRegisteredCommand),

    /// Print the per-user manifest
    GetManifest(list::GetManifestCommand),

    /// List the projects bound to an engine
    GetEngineProjects(list::GetEngineProjectsCommand),

    /// Resolve a project's gem dependencies into an output file
    ResolveGemDependencies(resolve::ResolveGemDependenciesCommand),

    /// Stitch the bound engine's CMake preset into a project
    UpdateCmakePresets(presets::UpdateCmakePresetsCommand),
}

impl Cli {
    /// Dispatch the parsed command.
    pub async fn execute(self) -> Result<()> {
        let ctx = Context::new(self.override_home_folder.as_deref())?;
        match self.command {
            Commands::Register(cmd) => cmd.execute(&ctx),
            Commands::CreateProject(cmd) => cmd.execute(&ctx),
            Commands::CreateGem(cmd) => cmd.execute(&ctx),
            Commands::CreateFromTemplate(cmd) => cmd.execute(&ctx),
            Commands::EnableGem(cmd) => cmd.execute(&ctx),
            Commands::DisableGem(cmd) => cmd.execute(&ctx),
            Commands::EditProjectProperties(cmd) => cmd.execute(&ctx),
            Commands::EditEngineProperties(cmd) => cmd.execute(&ctx),
            Commands::EditGemProperties(cmd) => cmd.execute(&ctx),
            Commands::DownloadGem(cmd) => cmd.execute(&ctx).await,
            Commands::RefreshRepo(cmd) => cmd.execute(&ctx).await,
            Commands::RefreshAllRepos(cmd) => cmd.execute(&ctx).await,
            Commands::GetRegistered(cmd) => cmd.execute(&ctx),
            Commands::GetManifest(cmd) => cmd.execute(&ctx),
            Commands::GetEngineProjects(cmd) => cmd.execute(&ctx),
            Commands::ResolveGemDependencies(cmd) => cmd.execute(&ctx),
            Commands::UpdateCmakePresets(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Per-invocation context: resolved home, manifest path and cache folder.
pub struct Context {
    /// The user's home folder (or its override)
    pub home: PathBuf,
    /// Path of the per-user manifest file
    pub manifest_path: PathBuf,
    /// Path of the repo manifest cache folder
    pub cache_dir: PathBuf,
}

impl Context {
    /// Resolve the context, honoring `--override-home-folder`.
    pub fn new(override_home: Option<&Path>) -> Result<Self> {
        Ok(Self {
            home: home_folder(override_home)?,
            manifest_path: manifest_path(override_home)?,
            cache_dir: cache_folder(override_home)?,
        })
    }

    /// Load the per-user manifest (empty skeleton when absent).
    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path)
    }

    /// Save the per-user manifest atomically.
    pub fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        manifest.save(&self.manifest_path)
    }
}
