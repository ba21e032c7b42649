//! The `create-project`, `create-gem` and `create-from-template` commands.
//!
//! Creation instantiates a registered template (or an explicit template
//! path) at the destination, stamps the identity field into the created
//! descriptor, and registers the result so it is immediately visible to
//! discovery and resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow};
use clap::Args;
use colored::Colorize;

use super::Context;
use crate::manifest::Manifest;
use crate::models::{GemDescriptor, ObjectKind, ProjectDescriptor};
use crate::registration::register_path;
use crate::template::{find_template, instantiate_template};

/// Default template name consumed by `create-project`.
const DEFAULT_PROJECT_TEMPLATE: &str = "DefaultProject";

/// Default template name consumed by `create-gem`.
const DEFAULT_GEM_TEMPLATE: &str = "DefaultGem";

fn pick_template(
    manifest: &Manifest,
    template_path: Option<&Path>,
    template_name: Option<&str>,
    default_name: &str,
) -> Result<PathBuf> {
    if let Some(path) = template_path {
        return Ok(path.to_path_buf());
    }
    find_template(manifest, template_name.unwrap_or(default_name))
}

fn name_from_destination(destination: &Path, explicit: Option<&str>) -> Result<String> {
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }
    destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Cannot derive a name from {}", destination.display()))
}

/// Create a project from a template.
#[derive(Args)]
pub struct CreateProjectCommand {
    /// Destination directory for the new project
    #[arg(long, value_name = "PATH")]
    project_path: PathBuf,

    /// Project name; defaults to the destination directory name
    #[arg(long, value_name = "NAME")]
    project_name: Option<String>,

    /// Template directory to instantiate
    #[arg(long, value_name = "PATH", conflicts_with = "template_name")]
    template_path: Option<PathBuf>,

    /// Registered template name to instantiate
    #[arg(long, value_name = "NAME")]
    template_name: Option<String>,

    /// Skip registering the created project
    #[arg(long)]
    no_register: bool,
}

impl CreateProjectCommand {
    /// Instantiate the template and register the project.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let mut manifest = ctx.load_manifest()?;
        let name = name_from_destination(&self.project_path, self.project_name.as_deref())?;
        let template = pick_template(
            &manifest,
            self.template_path.as_deref(),
            self.template_name.as_deref(),
            DEFAULT_PROJECT_TEMPLATE,
        )?;

        instantiate_template(&template, &self.project_path, &name)
            .with_context(|| format!("Failed to create project '{name}'"))?;

        // The template may or may not have produced a descriptor; either way
        // the created project carries the requested identity.
        let mut project = ProjectDescriptor::load(&self.project_path).unwrap_or_default();
        project.project_name.clone_from(&name);
        project.save(&self.project_path)?;

        if !self.no_register {
            register_path(&mut manifest, ObjectKind::Project, &self.project_path, false)?;
            ctx.save_manifest(&manifest)?;
        }
        println!(
            "{} Created project {} at {}",
            "✓".green(),
            name.cyan(),
            self.project_path.display()
        );
        Ok(())
    }
}

/// Create a gem from a template.
#[derive(Args)]
pub struct CreateGemCommand {
    /// Destination directory for the new gem
    #[arg(long, value_name = "PATH")]
    gem_path: PathBuf,

    /// Gem name; defaults to the destination directory name
    #[arg(long, value_name = "NAME")]
    gem_name: Option<String>,

    /// Template directory to instantiate
    #[arg(long, value_name = "PATH", conflicts_with = "template_name")]
    template_path: Option<PathBuf>,

    /// Registered template name to instantiate
    #[arg(long, value_name = "NAME")]
    template_name: Option<String>,

    /// Skip registering the created gem
    #[arg(long)]
    no_register: bool,
}

impl CreateGemCommand {
    /// Instantiate the template and register the gem for discovery.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let mut manifest = ctx.load_manifest()?;
        let name = name_from_destination(&self.gem_path, self.gem_name.as_deref())?;
        let template = pick_template(
            &manifest,
            self.template_path.as_deref(),
            self.template_name.as_deref(),
            DEFAULT_GEM_TEMPLATE,
        )?;

        instantiate_template(&template, &self.gem_path, &name)
            .with_context(|| format!("Failed to create gem '{name}'"))?;

        let mut gem = GemDescriptor::load(&self.gem_path).unwrap_or_default();
        gem.gem_name.clone_from(&name);
        gem.save(&self.gem_path)?;

        if !self.no_register {
            register_path(&mut manifest, ObjectKind::Gem, &self.gem_path, false)?;
            ctx.save_manifest(&manifest)?;
        }
        println!("{} Created gem {} at {}", "✓".green(), name.cyan(), self.gem_path.display());
        Ok(())
    }
}

/// Instantiate any registered template at a destination.
#[derive(Args)]
pub struct CreateFromTemplateCommand {
    /// Destination directory
    #[arg(long, value_name = "PATH")]
    destination_path: PathBuf,

    /// Template directory to instantiate
    #[arg(long, value_name = "PATH", conflicts_with = "template_name")]
    template_path: Option<PathBuf>,

    /// Registered template name to instantiate
    #[arg(long, value_name = "NAME")]
    template_name: Option<String>,

    /// Value substituted for ${Name}; defaults to the destination directory
    /// name
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
}

impl CreateFromTemplateCommand {
    /// Instantiate the template without registering anything.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        let name = name_from_destination(&self.destination_path, self.name.as_deref())?;
        let template = self.template_path.clone().map_or_else(
            || {
                let template_name = self
                    .template_name
                    .as_deref()
                    .ok_or_else(|| anyhow!("Pass --template-path or --template-name"))?;
                find_template(&manifest, template_name)
            },
            Ok,
        )?;

        instantiate_template(&template, &self.destination_path, &name)?;
        println!(
            "{} Instantiated template at {}",
            "✓".green(),
            self.destination_path.display()
        );
        Ok(())
    }
}
