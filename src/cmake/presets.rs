//! `CMakePresets.json` stitching.
//!
//! A project's preset file must include the bound engine's preset file
//! exactly once. The stitcher creates the file from a minimal template when
//! it does not exist, and otherwise edits only the top-level `include`
//! list, leaving every other key (and every other include) untouched.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::utils::{read_json_value, write_json_file};

/// File name of a CMake preset file at an engine or project root.
pub const PRESETS_FILE: &str = "CMakePresets.json";

/// Preset schema version written when creating the file from scratch.
const PRESET_VERSION: u64 = 4;

/// Outcome of a successful stitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePresetResult {
    /// The engine preset was appended to the include list
    EnginePathAdded,
    /// The include list already carried the engine preset; file unchanged
    EnginePathAlreadyIncluded,
}

/// Ensure `project_path`'s preset file includes `engine_path`'s preset
/// exactly once.
///
/// The engine must have a preset file at its root. Include entries are
/// compared as resolved paths against the project directory, so a relative
/// include that points at the engine preset counts as already included.
pub fn update_cmake_presets_for_project(
    project_path: &Path,
    engine_path: &Path,
) -> Result<UpdatePresetResult> {
    let engine_preset = engine_path.join(PRESETS_FILE);
    if !engine_preset.is_file() {
        return Err(anyhow!(
            "Engine at {} has no {PRESETS_FILE}",
            engine_path.display()
        ));
    }
    let engine_preset = engine_preset
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", engine_preset.display()))?;

    let project_preset = project_path.join(PRESETS_FILE);
    if !project_preset.exists() {
        let value = serde_json::json!({
            "version": PRESET_VERSION,
            "include": [engine_preset.to_string_lossy()]
        });
        write_json_file(&project_preset, &value)?;
        return Ok(UpdatePresetResult::EnginePathAdded);
    }

    let mut value = read_json_value(&project_preset)?;
    let object = value
        .as_object_mut()
        .with_context(|| format!("{} is not a JSON object", project_preset.display()))?;

    let includes = object
        .entry("include")
        .or_insert_with(|| serde_json::Value::Array(Vec::new()));
    let includes = includes
        .as_array_mut()
        .with_context(|| format!("'include' in {} is not a list", project_preset.display()))?;

    for entry in includes.iter() {
        let Some(entry) = entry.as_str() else {
            continue;
        };
        if include_matches(entry, project_path, &engine_preset) {
            return Ok(UpdatePresetResult::EnginePathAlreadyIncluded);
        }
    }

    includes.push(serde_json::Value::String(engine_preset.to_string_lossy().into_owned()));
    write_json_file(&project_preset, &value)?;
    Ok(UpdatePresetResult::EnginePathAdded)
}

fn include_matches(entry: &str, project_path: &Path, engine_preset: &Path) -> bool {
    let entry_path = Path::new(entry);
    let resolved = if entry_path.is_absolute() {
        entry_path.to_path_buf()
    } else {
        project_path.join(entry_path)
    };
    match resolved.canonicalize() {
        Ok(canonical) => canonical == engine_preset,
        Err(_) => resolved == engine_preset,
    }
}
