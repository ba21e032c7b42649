//! Common test fixtures for integration tests.
//!
//! `TestEnv` stands up an isolated home folder (so the per-user manifest
//! and cache never touch the real one) plus helpers to lay down engine,
//! project, gem and repo fixtures on disk.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use o3de_cli::manifest::{HOME_FOLDER, MANIFEST_FILE, Manifest};
use tempfile::TempDir;

/// Isolated home folder with manifest helpers.
pub struct TestEnv {
    temp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self { temp: TempDir::new().expect("create temp home") }
    }

    /// The overridden home folder.
    pub fn home(&self) -> &Path {
        self.temp.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.home().join(HOME_FOLDER).join(MANIFEST_FILE)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.home().join(HOME_FOLDER).join("cache")
    }

    pub fn load_manifest(&self) -> Manifest {
        Manifest::load(&self.manifest_path()).expect("load manifest")
    }

    pub fn save_manifest(&self, manifest: &Manifest) {
        manifest.save(&self.manifest_path()).expect("save manifest");
    }

    /// Write an `engine.json` fixture under `relative` and return its root.
    pub fn write_engine(&self, relative: &str, name: &str, version: &str) -> PathBuf {
        let dir = self.home().join(relative);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("engine.json"),
            serde_json::json!({"engine_name": name, "version": version}).to_string(),
        )
        .unwrap();
        dir
    }

    /// Write a `project.json` fixture under `relative` and return its root.
    pub fn write_project(
        &self,
        relative: &str,
        name: &str,
        engine: Option<&str>,
        gem_names: &[&str],
    ) -> PathBuf {
        let dir = self.home().join(relative);
        std::fs::create_dir_all(&dir).unwrap();
        let mut value = serde_json::json!({
            "project_name": name,
            "gem_names": gem_names,
            "external_subdirectories": ["Gems"]
        });
        if let Some(engine) = engine {
            value["engine"] = serde_json::json!(engine);
        }
        std::fs::write(dir.join("project.json"), value.to_string()).unwrap();
        std::fs::create_dir_all(dir.join("Gems")).unwrap();
        dir
    }

    /// Write a `gem.json` fixture under `root` and return the gem's root.
    pub fn write_gem(&self, root: &Path, name: &str, version: Option<&str>) -> PathBuf {
        let dir = match version {
            Some(version) => root.join(format!("{name}-{version}")),
            None => root.join(name),
        };
        std::fs::create_dir_all(&dir).unwrap();
        let mut value = serde_json::json!({"gem_name": name});
        if let Some(version) = version {
            value["version"] = serde_json::json!(version);
        }
        std::fs::write(dir.join("gem.json"), value.to_string()).unwrap();
        dir
    }

    /// Write a local `repo.json` source under `relative` and return its root.
    pub fn write_repo_source(
        &self,
        relative: &str,
        name: &str,
        repos: &[&str],
        gems_data: serde_json::Value,
    ) -> PathBuf {
        let dir = self.home().join(relative);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("repo.json"),
            serde_json::json!({"repo_name": name, "repos": repos, "gems_data": gems_data})
                .to_string(),
        )
        .unwrap();
        dir
    }
}
