//! The `refresh-repo`, `refresh-all-repos` and `download-gem` commands.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::Context;
use crate::models::ObjectKind;
use crate::registration::register_path;
use crate::repo::{download_gem, refresh_repo, refresh_repos};
use crate::version::GemSpecifier;

/// Refresh one repo's cached manifest.
#[derive(Args)]
pub struct RefreshRepoCommand {
    /// Repo URI to refresh (need not be registered)
    #[arg(long, value_name = "URI")]
    repo_uri: String,

    /// Only fetch when no cached manifest exists yet
    #[arg(long)]
    missing_only: bool,
}

impl RefreshRepoCommand {
    /// Fetch the repo manifest (and nested repos) into the cache.
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let mut visited = HashSet::new();
        refresh_repo(&ctx.cache_dir, &self.repo_uri, &mut visited, self.missing_only).await?;
        println!("{} Refreshed {} repo manifest(s)", "✓".green(), visited.len());
        Ok(())
    }
}

/// Refresh every registered repo's cached manifest.
#[derive(Args)]
pub struct RefreshAllReposCommand {
    /// Only fetch repos with no cached manifest yet
    #[arg(long)]
    missing_only: bool,
}

impl RefreshAllReposCommand {
    /// Fetch all registered repo manifests into the cache.
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let manifest = ctx.load_manifest()?;
        refresh_repos(&manifest, &ctx.cache_dir, self.missing_only).await?;
        println!("{} Refreshed {} registered repo(s)", "✓".green(), manifest.repos.len());
        Ok(())
    }
}

/// Download a gem advertised by a registered repo.
#[derive(Args)]
pub struct DownloadGemCommand {
    /// Gem name, optionally with a version specifier
    #[arg(long, value_name = "NAME")]
    gem_name: String,

    /// Destination folder; defaults to the manifest's gems folder
    #[arg(long, value_name = "PATH")]
    dest_path: Option<PathBuf>,

    /// Overwrite an existing download
    #[arg(long)]
    force: bool,

    /// Skip registering the downloaded gem
    #[arg(long)]
    no_register: bool,
}

impl DownloadGemCommand {
    /// Download, extract and register the gem.
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let mut manifest = ctx.load_manifest()?;
        let specifier = GemSpecifier::parse(&self.gem_name)?;

        // Make sure every cached manifest exists before searching.
        refresh_repos(&manifest, &ctx.cache_dir, true).await?;

        let dest_folder =
            self.dest_path.clone().unwrap_or_else(|| manifest.gems_folder(&ctx.home));
        let gem_root =
            download_gem(&manifest, &ctx.cache_dir, &specifier, &dest_folder, self.force).await?;

        if !self.no_register {
            register_path(&mut manifest, ObjectKind::Gem, &gem_root, false)?;
            ctx.save_manifest(&manifest)?;
        }
        println!(
            "{} Downloaded gem {} to {}",
            "✓".green(),
            specifier.name.cyan(),
            gem_root.display()
        );
        Ok(())
    }
}
