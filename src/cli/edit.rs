//! The `edit-*-properties` commands.
//!
//! Thin descriptor editors: load, apply the requested field changes, save
//! atomically. Version strings and dependency tokens are validated before
//! the write so a bad value never lands on disk.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::Context;
use crate::models::{EngineDescriptor, GemDescriptor};
use crate::version::{GemSpecifier, parse_gem_version};

fn validated_version(version: &str) -> Result<String> {
    parse_gem_version(version)?;
    Ok(version.to_string())
}

fn validated_tokens(tokens: &[String]) -> Result<()> {
    for token in tokens {
        GemSpecifier::parse(token)?;
    }
    Ok(())
}

/// Edit fields of a project.json.
#[derive(Args)]
pub struct EditProjectPropertiesCommand {
    /// Project path or registered project name
    #[arg(long, value_name = "PROJECT")]
    project: String,

    /// Rename the project
    #[arg(long, value_name = "NAME")]
    project_new_name: Option<String>,

    /// Set the project version
    #[arg(long, value_name = "VERSION")]
    project_version: Option<String>,

    /// Set the engine binding (NAME or NAME OP VERSION)
    #[arg(long, value_name = "ENGINE")]
    engine: Option<String>,

    /// Dependency tokens to append to gem_names
    #[arg(long = "add-gem-names", value_name = "TOKEN")]
    add_gem_names: Vec<String>,

    /// Gem names to drop from gem_names
    #[arg(long = "delete-gem-names", value_name = "NAME")]
    delete_gem_names: Vec<String>,
}

impl EditProjectPropertiesCommand {
    /// Apply the edits to the project descriptor.
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        let (project_path, mut project) =
            crate::registration::find_project(&manifest, &self.project)?;

        if let Some(name) = self.project_new_name {
            project.project_name = name;
        }
        if let Some(version) = &self.project_version {
            project.version = Some(validated_version(version)?);
        }
        if let Some(engine) = &self.engine {
            GemSpecifier::parse(engine)?;
            project.engine = Some(engine.clone());
        }
        validated_tokens(&self.add_gem_names)?;
        for token in self.add_gem_names {
            if !project.gem_names.contains(&token) {
                project.gem_names.push(token);
            }
        }
        for name in &self.delete_gem_names {
            project.gem_names.retain(|token| {
                GemSpecifier::parse(token).map(|t| &t.name != name).unwrap_or(true)
            });
        }

        project.save(&project_path)?;
        println!("{} Updated project {}", "✓".green(), project.project_name.cyan());
        Ok(())
    }
}

/// Edit fields of an engine.json.
#[derive(Args)]
pub struct EditEnginePropertiesCommand {
    /// Engine root path
    #[arg(long, value_name = "PATH")]
    engine_path: PathBuf,

    /// Rename the engine
    #[arg(long, value_name = "NAME")]
    engine_new_name: Option<String>,

    /// Set the engine version
    #[arg(long, value_name = "VERSION")]
    engine_version: Option<String>,
}

impl EditEnginePropertiesCommand {
    /// Apply the edits to the engine descriptor.
    pub fn execute(self, _ctx: &Context) -> Result<()> {
        let mut engine = EngineDescriptor::load(&self.engine_path)?;

        if let Some(name) = self.engine_new_name {
            engine.engine_name = name;
        }
        if let Some(version) = &self.engine_version {
            engine.version = Some(validated_version(version)?);
        }

        engine.save(&self.engine_path)?;
        println!("{} Updated engine {}", "✓".green(), engine.engine_name.cyan());
        Ok(())
    }
}

/// Edit fields of a gem.json.
#[derive(Args)]
pub struct EditGemPropertiesCommand {
    /// Gem root path
    #[arg(long, value_name = "PATH")]
    gem_path: PathBuf,

    /// Rename the gem
    #[arg(long, value_name = "NAME")]
    gem_new_name: Option<String>,

    /// Set the gem version
    #[arg(long, value_name = "VERSION")]
    gem_version: Option<String>,

    /// Dependency tokens to append
    #[arg(long = "add-dependencies", value_name = "TOKEN")]
    add_dependencies: Vec<String>,

    /// Dependency names to drop
    #[arg(long = "delete-dependencies", value_name = "NAME")]
    delete_dependencies: Vec<String>,
}

impl EditGemPropertiesCommand {
    /// Apply the edits to the gem descriptor.
    pub fn execute(self, _ctx: &Context) -> Result<()> {
        let mut gem = GemDescriptor::load(&self.gem_path)?;

        if let Some(name) = self.gem_new_name {
            gem.gem_name = name;
        }
        if let Some(version) = &self.gem_version {
            gem.version = Some(validated_version(version)?);
        }
        validated_tokens(&self.add_dependencies)?;
        for token in self.add_dependencies {
            if !gem.dependencies.contains(&token) {
                gem.dependencies.push(token);
            }
        }
        for name in &self.delete_dependencies {
            gem.dependencies.retain(|token| {
                GemSpecifier::parse(token).map(|t| &t.name != name).unwrap_or(true)
            });
        }

        gem.save(&self.gem_path)?;
        println!("{} Updated gem {}", "✓".green(), gem.gem_name.cyan());
        Ok(())
    }
}
