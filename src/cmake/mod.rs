//! Generated CMake file maintenance.
//!
//! Two small, stable contracts with the build system live here:
//!
//! - [`enabled_gems`] owns the generated `enabled_gems.cmake` file, a single
//!   `set(ENABLED_GEMS ...)` invocation listing the gem targets a project
//!   links in.
//! - [`presets`] stitches the chosen engine's `CMakePresets.json` into a
//!   project's preset file exactly once.
//!
//! Both files are rewritten atomically; the build must never observe a
//! partially written list.

pub mod enabled_gems;
pub mod presets;

pub use enabled_gems::{add_gem_dependency, get_enabled_gems, remove_gem_dependency};
pub use presets::{UpdatePresetResult, update_cmake_presets_for_project};
