//! o3de-cli - engine, project and gem registration with versioned gem
//! dependency resolution.
//!
//! The tool maintains a per-user manifest (`~/.o3de/o3de_manifest.json`)
//! registering engines, projects, gems, templates and remote repos, and
//! derives the build-facing artifacts from it: the resolved gem path list,
//! the generated `enabled_gems.cmake`, and the stitched `CMakePresets.json`.
//!
//! # Architecture Overview
//!
//! Every command follows one shape: load the manifest store, perform a
//! transformation, save atomically, and optionally emit a generated file.
//! The manifest file owns identity (which paths are registered); the
//! descriptor files (`engine.json`, `project.json`, `gem.json`,
//! `template.json`, `repo.json`) own descriptive attributes. The resolver
//! holds no persistent state of its own - its output file is a derived
//! cache.
//!
//! # Core Modules
//!
//! - [`manifest`] - the per-user manifest store: skeleton-on-absent load,
//!   atomic save, descriptor lookup by name or path
//! - [`models`] - tagged record types per descriptor kind, round-trip safe
//! - [`registration`] - add/remove registrations with identity uniqueness,
//!   conflict detection and engine-tree cascade
//! - [`version`] - the `NAME [OP VERSION]` dependency token grammar with a
//!   structured predicate
//! - [`resolver`] - candidate discovery and highest-satisfying-version
//!   selection into the build's `name;path` list
//! - [`cmake`] - the generated `enabled_gems.cmake` writer and the
//!   `CMakePresets.json` include stitcher
//! - [`repo`] - content-addressed cache of remote repo manifests, with
//!   cycle-guarded recursive refresh and gem downloads
//! - [`template`] - template payload instantiation for project and gem
//!   creation
//! - [`cli`] - the clap command surface
//!
//! # Concurrency Model
//!
//! One CLI invocation per process, single logical thread of work. The only
//! shared writable resources are the manifest file and the generated CMake
//! files; all writers use write-temp-then-rename on the same filesystem, so
//! concurrent processes are last-writer-wins rather than corrupting.

pub mod cli;
pub mod cmake;
pub mod core;
pub mod manifest;
pub mod models;
pub mod registration;
pub mod repo;
pub mod resolver;
pub mod template;
pub mod utils;
pub mod version;
